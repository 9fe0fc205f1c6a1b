//! Client-side filtering, metric computation, and the pipeline that ties
//! retrieval and analysis together.

mod comments;
mod filter;
mod metrics;
mod pipeline;

pub use comments::CommentAggregator;
pub use filter::{FilterEngine, Predicate};
pub use metrics::compute_metrics;
pub use pipeline::{Analyzer, CancelFlag};
