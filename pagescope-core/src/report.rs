// Report rendering for analysis results

use crate::model::{AnalysisResult, LinkDetails};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

pub fn render_report(result: &AnalysisResult, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(result)),
        ReportFormat::Json => generate_json_report(result),
        ReportFormat::Markdown => Ok(generate_markdown_report(result)),
    }
}

/// Same body the HTTP API returns
pub fn generate_json_report(result: &AnalysisResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

pub fn generate_text_report(result: &AnalysisResult) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("                         PAGESCOPE ANALYSIS REPORT\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str(&format!("URL:          {}\n", result.url));
    report.push_str(&format!("Analyzed:     {}\n", generated_at()));
    report.push_str(&format!("HTML version: {}\n", result.html_version));
    report.push_str(&format!("Title:        {}\n", display_title(&result.page_title)));
    report.push_str(&format!(
        "Login form:   {}\n",
        if result.page_contains_login_form { "yes" } else { "no" }
    ));
    report.push('\n');

    report.push_str(RULE);
    report.push_str("HEADINGS\n");
    report.push_str(RULE);
    report.push('\n');
    for (level, count) in heading_levels(result) {
        report.push_str(&format!("  h{}  {}\n", level, count));
    }
    report.push('\n');

    report.push_str(RULE);
    report.push_str("LINKS\n");
    report.push_str(RULE);
    report.push('\n');
    report.push_str(&format!(
        "  Internal: {}   External: {}   Failed: {}",
        result.links.internal.count, result.links.external.count, result.links.failed.count
    ));
    if result.dropped_links > 0 {
        report.push_str(&format!("   Dropped: {}", result.dropped_links));
    }
    report.push_str("\n\n");

    push_text_group(&mut report, "Internal", &result.links.internal);
    push_text_group(&mut report, "External", &result.links.external);
    push_text_group(&mut report, "Failed", &result.links.failed);

    report.push_str(RULE);
    report.push_str("                               End of Report\n");
    report.push_str(RULE);

    report
}

pub fn generate_markdown_report(result: &AnalysisResult) -> String {
    let mut report = String::new();

    report.push_str(&format!("# Page analysis: {}\n\n", result.url));
    report.push_str(&format!("_Generated {}_\n\n", generated_at()));

    report.push_str("| Field | Value |\n|---|---|\n");
    report.push_str(&format!("| HTML version | {} |\n", result.html_version));
    report.push_str(&format!(
        "| Title | {} |\n",
        display_title(&result.page_title).replace('|', "\\|")
    ));
    report.push_str(&format!(
        "| Login form | {} |\n",
        if result.page_contains_login_form { "yes" } else { "no" }
    ));
    report.push_str(&format!("| Dropped hrefs | {} |\n\n", result.dropped_links));

    report.push_str("## Headings\n\n");
    report.push_str("| h1 | h2 | h3 | h4 | h5 | h6 |\n|---|---|---|---|---|---|\n");
    let counts: Vec<String> = heading_levels(result)
        .iter()
        .map(|(_, count)| count.to_string())
        .collect();
    report.push_str(&format!("| {} |\n\n", counts.join(" | ")));

    report.push_str("## Links\n\n");
    push_markdown_group(&mut report, "Internal", &result.links.internal);
    push_markdown_group(&mut report, "External", &result.links.external);
    push_markdown_group(&mut report, "Failed", &result.links.failed);

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn push_text_group(report: &mut String, name: &str, details: &LinkDetails) {
    report.push_str(&format!("{} ({})\n", name, details.count));
    report.push_str("────────────────────────────────────────────────────────────────────────────────\n");
    if details.urls.is_empty() {
        report.push_str("  (none)\n");
    }
    for url in &details.urls {
        report.push_str(&format!("  {}\n", url));
    }
    report.push('\n');
}

fn push_markdown_group(report: &mut String, name: &str, details: &LinkDetails) {
    report.push_str(&format!("### {} ({})\n\n", name, details.count));
    if details.urls.is_empty() {
        report.push_str("_none_\n\n");
        return;
    }
    for url in &details.urls {
        report.push_str(&format!("- <{}>\n", url));
    }
    report.push('\n');
}

fn heading_levels(result: &AnalysisResult) -> [(u8, usize); 6] {
    let h = &result.heading_count;
    [(1, h.h1), (2, h.h2), (3, h.h3), (4, h.h4), (5, h.h5), (6, h.h6)]
}

fn display_title(title: &str) -> &str {
    let trimmed = title.trim();
    if trimmed.is_empty() { "(untitled)" } else { trimmed }
}

fn generated_at() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
