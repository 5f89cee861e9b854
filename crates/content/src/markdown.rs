//! Markdown to HTML conversion.

use pulldown_cmark::{Event, Options, Parser, Tag, html};

/// Converts a Markdown body to an HTML fragment.
///
/// Tables, footnotes and strikethrough are enabled; everything else is
/// CommonMark. The output is a fragment — the surrounding document shell
/// comes from the page template.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Collects the URLs of images referenced by a Markdown body, in document
/// order. Duplicates are kept; callers that care can dedupe.
pub fn media_refs(markdown: &str) -> Vec<String> {
    Parser::new(markdown)
        .filter_map(|event| match event {
            Event::Start(Tag::Image { dest_url, .. }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect()
}

/// Derives a plain-text summary from a Markdown body.
///
/// Collects text events until the budget is reached, then truncates at a
/// character boundary with an ellipsis. Used when frontmatter provides no
/// summary of its own.
pub fn summarize(markdown: &str, max_chars: usize) -> String {
    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(_) if !text.is_empty() && !text.ends_with(' ') => text.push(' '),
            _ => {},
        }
        if text.chars().count() > max_chars {
            break;
        }
    }
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}…", truncated.trim_end())
}
