//! Output formatting - plaintext and JSON.

use std::path::Path;

use crate::builder::AnalysisResult;
use crate::syntax::CallSite;

/// Renders `site` with its path relative to `root` when possible.
fn format_site(root: &Path, site: &CallSite) -> String {
    let file = site.file.strip_prefix(root).unwrap_or(&site.file);
    format!(
        "{}:{}:{}  {}",
        file.display(),
        site.line,
        site.column,
        site.snippet
    )
}

/// Plain text rendering of an analysis, one block per statement.
pub fn render_plain(result: &AnalysisResult) -> String {
    let mut out = String::new();
    if result.resolutions.is_empty() {
        out.push_str("No statements to resolve.\n");
        return out;
    }
    for resolution in &result.resolutions {
        let count = resolution.call_sites.len();
        out.push_str(&format!(
            "{} ({} call site{}):\n",
            resolution.statement,
            count,
            if count == 1 { "" } else { "s" }
        ));
        for site in &resolution.call_sites {
            out.push_str("  ");
            out.push_str(&format_site(&result.root, site));
            out.push('\n');
        }
    }
    out.push_str(&format!(
        "\n{} statements, {} call sites, {} java files\n",
        result.stats.statements, result.stats.call_sites, result.stats.java_files
    ));
    out
}

/// Prints call sites in plain text format.
pub fn print_plain(result: &AnalysisResult) {
    print!("{}", render_plain(result));
}

/// Prints the whole analysis in JSON format.
///
/// Falls back to a one-line summary if serialization fails.
pub fn print_json(result: &AnalysisResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::warn!(error = %e, "JSON serialization failed");
            println!(
                "{{\"statements\": {}, \"call_sites\": {}}}",
                result.stats.statements, result.stats.call_sites
            );
        }
    }
}
