//! The Sénat "jeu complet": every deposited amendement of a text as a
//! tab-separated, cp1252-encoded file whose first line is not data.

use std::collections::HashMap;

use encoding_rs::WINDOWS_1252;

use crate::FetchError;

pub const COLUMNS: usize = 12;

/// One data row, keyed by trimmed column header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or_default()
    }
}

/// Decode and split the file. Any line that does not have exactly
/// [`COLUMNS`] fields once repaired aborts parsing.
pub fn parse_jeu_complet(bytes: &[u8]) -> Result<Vec<Row>, FetchError> {
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    let mut lines = text.lines().skip(1).filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = filter_line(header)?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    lines
        .map(|line| {
            let fields = filter_line(line)?;
            Ok(Row {
                fields: header.iter().cloned().zip(fields).collect(),
            })
        })
        .collect()
}

/// Split a line on tabs, re-merging HTML bodies that contain unescaped tabs.
pub fn filter_line(line: &str) -> Result<Vec<String>, FetchError> {
    let merged: Vec<String> = merge_badly_split_chunks(line.split('\t'))
        .into_iter()
        .map(|chunk| unquote(&chunk))
        .collect();
    if merged.len() != COLUMNS {
        return Err(FetchError::MalformedLine(line.to_string()));
    }
    Ok(merged)
}

fn merge_badly_split_chunks<'a>(mut chunks: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut merged = Vec::new();
    while let Some(chunk) = chunks.next() {
        let mut chunk = chunk.to_string();
        while chunk.starts_with("<body>") && !chunk.trim_end().ends_with("</body>") {
            match chunks.next() {
                Some(next) => {
                    chunk.push(' ');
                    chunk.push_str(next);
                }
                None => break,
            }
        }
        merged.push(chunk);
    }
    merged
}

/// Strip CSV quoting from a field: `"a ""b"""` is `a "b"`.
fn unquote(field: &str) -> String {
    match field.strip_prefix('"').and_then(|f| f.strip_suffix('"')) {
        Some(inner) if field.len() >= 2 => inner.replace("\"\"", "\""),
        _ => field.to_string(),
    }
}
