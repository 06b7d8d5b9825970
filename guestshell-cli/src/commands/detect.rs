//! Tool detection command.

use std::fmt::Write as _;

use guestshell_core::tools::{ToolInfo, detect_all};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Detect command handler
pub fn cmd_detect(format: OutputFormat) -> Result<(), CliError> {
    let tools = detect_all();
    match format {
        OutputFormat::Text => println!("{}", format_table(&tools)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&tools)
                .map_err(|e| CliError::Output(format!("Failed to serialize tools: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Format detected tools as a table string
#[must_use]
pub fn format_table(tools: &[ToolInfo]) -> String {
    let name_width = tools
        .iter()
        .map(|t| t.tool.as_str().len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    let _ = writeln!(output, "{:<name_width$}  {:<9}  VERSION", "TOOL", "INSTALLED");
    let _ = writeln!(output, "{:-<name_width$}  {:-<9}  {:-<7}", "", "", "");
    for info in tools {
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<9}  {}",
            info.tool.as_str(),
            if info.installed { "yes" } else { "no" },
            info.version.as_deref().unwrap_or("-")
        );
    }
    output.trim_end().to_string()
}
