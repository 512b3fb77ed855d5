//! HTML sanitizing for upstream amendement bodies.

use scraper::{ElementRef, Html};

const ALLOWED_TAGS: [&str; 18] = [
    "div", "p", "h3", "ul", "ol", "li", "b", "i", "strong", "em", "sub", "sup", "table", "thead",
    "th", "tbody", "tr", "td",
];

const VOID_TAGS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn allowed_attribute(tag: &str, attr: &str) -> bool {
    matches!((tag, attr), ("td", "colspan") | ("th", "colspan"))
}

#[derive(Clone, Copy)]
enum Pass {
    /// Re-serialize everything with text left unescaped, which decodes
    /// entities such as `&lt;p&gt;` into markup.
    Decode,
    /// Keep allowed tags and attributes; other tags are dropped, their
    /// content kept.
    Sanitize,
}

/// Decode entities, then keep only a small set of structural and inline
/// tags. The result is trimmed.
pub fn clean_html(html: &str) -> String {
    let decoded = serialize_fragment(html, Pass::Decode);
    serialize_fragment(&decoded, Pass::Sanitize).trim().to_string()
}

fn serialize_fragment(html: &str, pass: Pass) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    walk(fragment.root_element(), pass, &mut out);
    out
}

fn walk(element: ElementRef<'_>, pass: Pass, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            match pass {
                Pass::Decode => out.push_str(text),
                Pass::Sanitize => push_escaped_text(text, out),
            }
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        let keep = match pass {
            Pass::Decode => true,
            Pass::Sanitize => ALLOWED_TAGS.contains(&name),
        };
        if !keep {
            walk(child, pass, out);
            continue;
        }
        out.push('<');
        out.push_str(name);
        for (attr, value) in child.value().attrs() {
            if matches!(pass, Pass::Decode) || allowed_attribute(name, attr) {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                out.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
                out.push('"');
            }
        }
        out.push('>');
        if VOID_TAGS.contains(&name) {
            continue;
        }
        walk(child, pass, out);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

fn push_escaped_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_allowed_tags() {
        assert_eq!(
            clean_html("<p>Supprimer <strong>cet</strong> article.</p>"),
            "<p>Supprimer <strong>cet</strong> article.</p>"
        );
    }

    #[test]
    fn strips_other_tags_and_keeps_content() {
        assert_eq!(
            clean_html("<body><p style=\"text-align: justify;\">A <a href=\"x\">lien</a></p></body>"),
            "<p>A lien</p>"
        );
    }

    #[test]
    fn decodes_entities_before_sanitizing() {
        assert_eq!(clean_html("&lt;p&gt;L&#8217;article&lt;/p&gt;"), "<p>L\u{2019}article</p>");
    }

    #[test]
    fn keeps_colspan_only_on_cells() {
        assert_eq!(
            clean_html("<table><tbody><tr><td colspan=\"2\" class=\"x\">1</td></tr></tbody></table>"),
            "<table><tbody><tr><td colspan=\"2\">1</td></tr></tbody></table>"
        );
    }

    #[test]
    fn escapes_remaining_text() {
        assert_eq!(clean_html("  a &amp;amp; b  "), "a &amp; b");
    }
}
