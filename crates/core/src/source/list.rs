//! Source-list parsing.

use super::types::SourceId;

const HEADER_TOKENS: &[&str] = &[
    "source",
    "source_url",
    "source_id",
    "url",
    "path",
    "file",
    "filename",
    "image",
    "image_url",
];

/// Parse a batch input list: one source per line, first comma-separated
/// field of each row. Blank lines and `#` comments are ignored, as is a
/// leading header row.
pub fn parse_source_list(input: &str) -> Vec<SourceId> {
    let mut sources = Vec::new();
    let mut seen_data_line = false;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let field = line.split(',').next().unwrap_or("").trim();
        if field.is_empty() {
            continue;
        }

        if !seen_data_line {
            seen_data_line = true;
            if is_header(field) {
                continue;
            }
        }

        sources.push(SourceId::parse(field));
    }

    sources
}

fn is_header(field: &str) -> bool {
    let lower = field.to_ascii_lowercase();
    HEADER_TOKENS.contains(&lower.as_str())
}
