use crate::Result;
use crate::models::AnalysisResult;
use ohno::IntoAppError;
use std::io::Write;

/// One row per matched issue, dates in RFC 3339.
pub fn generate<W: Write>(result: &AnalysisResult, writer: &mut W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record([
        "number",
        "title",
        "state",
        "author",
        "labels",
        "assignees",
        "comment_count",
        "created_at",
        "updated_at",
        "closed_at",
        "url",
        "comments_unavailable",
    ])
    .into_app_err("writing CSV header")?;

    for issue in &result.issues {
        csv.write_record([
            issue.number.to_string(),
            issue.title.clone(),
            issue.state.as_str().to_string(),
            issue.author.clone().unwrap_or_default(),
            issue.labels.join(";"),
            issue.assignees.join(";"),
            issue.comment_count.to_string(),
            issue.created_at.to_rfc3339(),
            issue.updated_at.to_rfc3339(),
            issue.closed_at.map(|c| c.to_rfc3339()).unwrap_or_default(),
            issue.url.clone(),
            issue.comments_unavailable.to_string(),
        ])
        .into_app_err("writing CSV row")?;
    }

    csv.flush()?;
    Ok(())
}
