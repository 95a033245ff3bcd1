use std::sync::LazyLock;

use regex::Regex;

/// Appended to text cut short by [`truncate_html_words`].
pub const TRUNCATION_MARK: &str = " …";

// A tag, or a run of text that counts as one word (captured)
static RE_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+?>|([^<>\s]+)").expect("word pattern is valid"));

// (closing slash)(tag name)(self-closing slash)
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^<(/)?(\S+?)(?:(\s*/)|\s.*?)?>").expect("tag pattern is valid")
});

// Elements that never take a closing tag
const VOID_ELEMENTS: [&str; 9] = [
    "br", "col", "link", "base", "img", "param", "area", "hr", "input",
];

/// Cuts HTML after `length` words of text, keeping the markup well formed.
///
/// Only text outside of tags counts towards the limit. When the input is
/// short enough it is returned untouched; otherwise the cut is followed by
/// [`TRUNCATION_MARK`] and closing tags for every element still open.
pub fn truncate_html_words(html: &str, length: usize) -> String {
    if length == 0 {
        return String::new();
    }

    let mut words = 0;
    let mut end_text_pos = None;
    // most recently opened first
    let mut open_tags: Vec<String> = Vec::new();

    for m in RE_WORDS.captures_iter(html) {
        if words > length {
            break;
        }

        let Some(whole) = m.get(0) else {
            continue;
        };

        if m.get(1).is_some() {
            words += 1;
            if words == length {
                end_text_pos = Some(whole.end());
            }
            continue;
        }

        // tags past the cut are dropped anyway
        if end_text_pos.is_some() {
            continue;
        }

        let Some(tag) = RE_TAG.captures(whole.as_str()) else {
            continue;
        };
        let closing = tag.get(1).is_some();
        let self_closing = tag.get(3).is_some();
        let name = tag
            .get(2)
            .map(|n| n.as_str().to_lowercase())
            .unwrap_or_default();

        // comments, declarations and processing instructions are never closed
        if name.starts_with(['!', '?']) {
            continue;
        }

        if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
            continue;
        }

        if closing {
            // close this tag and anything left open inside it
            if let Some(i) = open_tags.iter().position(|t| *t == name) {
                open_tags.drain(..=i);
            }
        } else {
            open_tags.insert(0, name);
        }
    }

    let Some(end_text_pos) = end_text_pos.filter(|_| words > length) else {
        return html.to_string();
    };

    let mut out = String::with_capacity(end_text_pos + TRUNCATION_MARK.len());
    out.push_str(&html[..end_text_pos]);
    out.push_str(TRUNCATION_MARK);
    for tag in open_tags {
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
    }
    out
}
