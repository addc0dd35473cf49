use anyhow::{Context, Result};
use regex::Regex;

/// Length in characters, the unit every chapter metric uses.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Collapse every whitespace run to a single space and trim both ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Elements that end a line of text when rendered.
const BREAK_TAGS: &[&str] = &[
    "p", "div", "br", "hr", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "dl", "dt",
    "dd", "tr", "td", "th", "table", "blockquote", "section", "article", "header", "footer",
    "aside", "nav", "figure", "figcaption", "pre", "title", "head", "body", "html",
];

/// Lowercased element name of the tag at the start of `tag`, without the `/`.
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Strip HTML tags, dropping script and style bodies, and collapse whitespace.
pub fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        result.push_str(&rest[..open]);
        rest = &rest[open..];

        // Inline markup joins its neighbours: "C<b>a</b>t" reads "Cat".
        let name = tag_name(rest);
        if BREAK_TAGS.contains(&name.as_str()) {
            result.push(' ');
        }

        let skip_until = match name.as_str() {
            _ if rest.starts_with("</") => None,
            "script" => Some("</script"),
            "style" => Some("</style"),
            _ => None,
        };

        if let Some(closing) = skip_until {
            match find_ascii_case_insensitive(rest, closing) {
                Some(pos) => rest = &rest[pos..],
                None => {
                    rest = "";
                    break;
                }
            }
        }

        match rest.find('>') {
            Some(close) => rest = &rest[close + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }
    result.push_str(rest);

    normalize_whitespace(&decode_entities(&result))
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Decode the handful of entities that show up in book markup.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Make a chapter title safe to use as a file name.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|ch| match ch {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let collapsed = normalize_whitespace(&replaced);
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c == ' ');
    let truncated = truncate_chars(trimmed, 100);

    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated.to_string()
    }
}

/// Compiled patterns for pulling a display title out of an XHTML document.
#[derive(Debug, Clone)]
pub struct TitlePatterns {
    heading: Regex,
    title: Regex,
}

impl TitlePatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading: Regex::new(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>")
                .context("failed to compile heading regex")?,
            title: Regex::new(r"(?is)<title[^>]*>(.*?)</title>")
                .context("failed to compile title regex")?,
        })
    }

    /// First non-empty heading, then the `<title>` element.
    pub fn extract(&self, html: &str) -> Option<String> {
        [&self.heading, &self.title].into_iter().find_map(|re| {
            let inner = re.captures(html)?.get(1)?.as_str();
            let text = strip_html_tags(inner);
            (!text.is_empty()).then_some(text)
        })
    }
}
