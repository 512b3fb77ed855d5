//! Word-level HTML diff and small text helpers for event details.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

/// Diff two texts word by word, wrapping removed runs in `<del>` and added
/// runs in `<ins>`. Within a changed region deletions come first.
pub fn html_diff(old_text: &str, new_text: &str) -> String {
    let old: Vec<&str> = old_text.split_whitespace().collect();
    let new: Vec<&str> = new_text.split_whitespace().collect();
    let ops = diff_words(&old, &new);

    let mut fragments = Vec::new();
    let mut start = 0;
    while start < ops.len() {
        let op = ops[start].0;
        let end = ops[start..]
            .iter()
            .position(|(o, _)| *o != op)
            .map_or(ops.len(), |offset| start + offset);
        let words: Vec<&str> = ops[start..end].iter().map(|(_, w)| *w).collect();
        let text = escape(&words.join(" "));
        fragments.push(match op {
            Op::Equal => text,
            Op::Delete => format!("<del>{text}</del>"),
            Op::Insert => format!("<ins>{text}</ins>"),
        });
        start = end;
    }
    fragments.join(" ").trim().to_string()
}

fn diff_words<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<(Op, &'a str)> {
    let (n, m) = (old.len(), new.len());
    // lcs[i][j]: longest common subsequence of old[i..] and new[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let mut deleted = Vec::new();
    let mut inserted = Vec::new();
    let flush = |ops: &mut Vec<(Op, &'a str)>, deleted: &mut Vec<&'a str>, inserted: &mut Vec<&'a str>| {
        ops.extend(deleted.drain(..).map(|w| (Op::Delete, w)));
        ops.extend(inserted.drain(..).map(|w| (Op::Insert, w)));
    };

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            flush(&mut ops, &mut deleted, &mut inserted);
            ops.push((Op::Equal, old[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            deleted.push(old[i]);
            i += 1;
        } else {
            inserted.push(new[j]);
            j += 1;
        }
    }
    deleted.extend_from_slice(&old[i..]);
    inserted.extend_from_slice(&new[j..]);
    flush(&mut ops, &mut deleted, &mut inserted);
    ops
}

/// Escape `& < > " '` for HTML text and attribute contexts.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Remove markup and collapse whitespace.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts() {
        assert_eq!(html_diff("a b c", "a b c"), "a b c");
    }

    #[test]
    fn replaced_word_deletes_first() {
        assert_eq!(html_diff("a b c", "a x c"), "a <del>b</del> <ins>x</ins> c");
    }

    #[test]
    fn added_and_removed_runs_are_grouped() {
        assert_eq!(html_diff("", "nouveau texte"), "<ins>nouveau texte</ins>");
        assert_eq!(html_diff("ancien texte", ""), "<del>ancien texte</del>");
        assert_eq!(
            html_diff("Supprimer cet article.", "Supprimer cet alinéa et le suivant."),
            "Supprimer cet <del>article.</del> <ins>alinéa et le suivant.</ins>"
        );
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(html_diff("", "<p>l'a</p>"), "<ins>&lt;p&gt;l&#x27;a&lt;/p&gt;</ins>");
    }

    #[test]
    fn strip_tags_collapses_whitespace() {
        assert_eq!(strip_tags("<p>Cet   amendement</p><p>vise</p>"), "Cet amendement vise");
        assert_eq!(strip_tags("plain"), "plain");
    }
}
