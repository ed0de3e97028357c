//! Terminal rendering helpers for CLI output.

use crate::core::provision::{EntryStatus, ProvisionReport};
use colored::Colorize;

/// `--format` values shared by every command.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// One line per report entry, e.g. `  ✓ behaviors  created`.
pub fn render_report(report: &ProvisionReport) -> String {
    let width = report
        .entries
        .iter()
        .map(|e| e.collection.len())
        .max()
        .unwrap_or(0);
    report
        .entries
        .iter()
        .map(|entry| {
            let marker = match entry.status {
                EntryStatus::Created => "✓".bright_green(),
                EntryStatus::Exists => "•".bright_yellow(),
                EntryStatus::Drifted => "!".bright_yellow().bold(),
                EntryStatus::Failed => "✗".bright_red().bold(),
            };
            let mut line = format!(
                "  {} {:<width$}  {}",
                marker,
                entry.collection,
                entry.status,
                width = width
            );
            if let Some(detail) = &entry.detail {
                line.push_str(&format!(" ({})", compact_line(detail, 120)));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
