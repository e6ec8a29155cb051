use regex::Regex;
use std::sync::LazyLock;

use crate::types::*;

// --- Declaration grammars ---

static RE_ENUM_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*enum\s+([A-Za-z_]\w*)\s*\{(.*)$").unwrap());
static RE_TABLE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*table\s+([A-Za-z_]\w*)\s*\{(.*)$").unwrap());
static RE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*ref:?\s*"([^"]+)"\s*\.\s*"([^"]+)"\s+(\S+)\s+"([^"]+)"\s*\.\s*"([^"]+)"\s*$"#)
        .unwrap()
});
static RE_DECL_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(enum|table|ref)\b").unwrap());
static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*//").unwrap());

/// Scan raw ERD text and extract the three syntactic block kinds: enum
/// declarations, table declarations, and relationship lines.
///
/// Declarations that start with a recognized keyword but do not match the
/// grammar produce a diagnostic instead of a block; any other text is
/// ignored, so prose around the declarations stays harmless.
pub fn extract(content: &str, file: &str) -> RawErd {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut raw = RawErd::default();
    let total = lines.len();
    let mut i = 0;

    while i < total {
        let line = lines[i].strip_suffix('\r').unwrap_or(lines[i]);
        let line_num = i + 1;

        if line.trim().is_empty() || RE_COMMENT.is_match(line) {
            i += 1;
            continue;
        }

        if let Some(caps) = RE_ENUM_HEADER.captures(line) {
            let name = caps[1].to_string();
            let (body, next) = collect_block_body(&lines, i, &caps[2], file, &mut raw.diagnostics);
            let values = body
                .iter()
                .filter_map(|(text, _)| clean_enum_value(text))
                .collect();
            raw.enums.push(RawEnum {
                name,
                line: line_num,
                values,
            });
            i = next;
            continue;
        }

        if let Some(caps) = RE_TABLE_HEADER.captures(line) {
            let name = caps[1].to_string();
            let (body, next) = collect_block_body(&lines, i, &caps[2], file, &mut raw.diagnostics);
            let fields = body
                .into_iter()
                .filter(|(text, _)| !text.trim().is_empty() && !RE_COMMENT.is_match(text))
                .map(|(text, line)| RawField {
                    raw: text.trim().to_string(),
                    line,
                })
                .collect();
            raw.tables.push(RawTable {
                name,
                line: line_num,
                fields,
            });
            i = next;
            continue;
        }

        if let Some(caps) = RE_REF.captures(line) {
            raw.refs.push(RawRef {
                from_table: caps[1].to_string(),
                from_field: caps[2].to_string(),
                dir: caps[3].to_string(),
                to_table: caps[4].to_string(),
                to_field: caps[5].to_string(),
                line: line_num,
            });
            i += 1;
            continue;
        }

        // A declaration keyword that did not match its grammar is a real
        // authoring mistake, not surrounding prose.
        if RE_DECL_KEYWORD.is_match(line) {
            raw.diagnostics.push(Diagnostic::error(
                "DVERD-E001",
                file,
                line_num,
                1,
                format!("Malformed declaration: {}", line.trim()),
            ));
        }

        i += 1;
    }

    raw
}

/// Collect the brace-delimited body of a block whose header sits at
/// `lines[start]`, with `header_rest` being the text after the opening
/// brace. Returns the body lines (with line numbers) and the index of the
/// first line after the block.
fn collect_block_body(
    lines: &[&str],
    start: usize,
    header_rest: &str,
    file: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<(String, usize)>, usize) {
    let mut body: Vec<(String, usize)> = Vec::new();

    // Body content may begin on the header line itself, and a one-line
    // declaration closes there too.
    if let Some(pos) = header_rest.find('}') {
        let inline = header_rest[..pos].trim();
        if !inline.is_empty() {
            body.push((inline.to_string(), start + 1));
        }
        return (body, start + 1);
    }
    if !header_rest.trim().is_empty() {
        body.push((header_rest.trim().to_string(), start + 1));
    }

    let mut i = start + 1;
    while i < lines.len() {
        let line = lines[i].strip_suffix('\r').unwrap_or(lines[i]);
        if let Some(pos) = line.find('}') {
            let last = line[..pos].trim();
            if !last.is_empty() {
                body.push((last.to_string(), i + 1));
            }
            return (body, i + 1);
        }
        body.push((line.to_string(), i + 1));
        i += 1;
    }

    diagnostics.push(Diagnostic::error(
        "DVERD-E003",
        file,
        start + 1,
        1,
        "Unclosed block: missing `}`".to_string(),
    ));
    (body, i)
}

/// Strip a raw enum body line down to a bare value token. Blank lines and
/// comment lines yield nothing; trailing punctuation and quoting go away.
fn clean_enum_value(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") {
        return None;
    }
    let token = trimmed
        .trim_end_matches([',', ';'])
        .trim_matches(['"', '\''])
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
