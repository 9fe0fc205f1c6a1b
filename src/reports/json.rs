use crate::Result;
use crate::models::AnalysisResult;
use core::fmt::Write;

pub fn generate<W: Write>(result: &AnalysisResult, writer: &mut W) -> Result<()> {
    write!(writer, "{}", serde_json::to_string_pretty(result)?)?;
    Ok(())
}
