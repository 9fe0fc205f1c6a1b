mod criteria;
mod issue;
mod metrics;
mod progress;
mod result;

pub use criteria::{DEFAULT_PAGE_SIZE, FilterCriteria, MatchMode, StateFilter};
pub use issue::{Comment, Issue, IssueState};
pub use metrics::{ActivityBucket, ActivityMetrics, BucketGranularity, LabelCount, LabelTrend, TrendDirection, UserActivity};
pub use progress::{Phase, ProgressListener, ProgressSnapshot, ProgressTracker};
pub use result::{AnalysisResult, RepoDescriptor};
