//! Markdown-to-plain-text pipeline.
//!
//! Each pass is a function `&str -> String` applied in sequence. The first
//! pass walks the CommonMark event stream so emphasis markers, heading
//! hashes, link brackets and fences never reach the output.

use std::sync::LazyLock;

use pulldown_cmark::{Event, Parser, TagEnd};
use regex::Regex;

/// Run the full strip pipeline on a markdown body.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = render_plain_text(md);

    result = trim_line_ends(&result);
    result = collapse_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Render text content only
// ---------------------------------------------------------------------------

/// Keep text, inline code, and image alt text; end every block with a newline.
fn render_plain_text(md: &str) -> String {
    let mut out = String::with_capacity(md.len());

    for event in Parser::new(md) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::Html(html) | Event::InlineHtml(html) => out.push_str(&strip_html_tags(&html)),
            Event::SoftBreak | Event::HardBreak | Event::Rule => out.push('\n'),
            Event::End(end) if ends_block(&end) => out.push('\n'),
            _ => {}
        }
    }

    out
}

fn ends_block(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::Item
            | TagEnd::CodeBlock
            | TagEnd::HtmlBlock
            | TagEnd::TableHead
            | TagEnd::TableRow
    )
}

/// Remove HTML tags, keeping the text between them.
fn strip_html_tags(html: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    TAG_RE.replace_all(html, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Trailing whitespace
// ---------------------------------------------------------------------------

fn trim_line_ends(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 3: Blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into one.
fn collapse_blank_lines(text: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(text, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_headings_and_emphasis() {
        let out = run_pipeline("# Title\n\nSome **bold** and _italic_ text.\n");
        assert_eq!(out, "Title\nSome bold and italic text.");
    }

    #[test]
    fn keeps_link_text_and_image_alt() {
        let out = run_pipeline("See [the guide](https://example.com/guide) or ![a diagram](d.png).");
        assert_eq!(out, "See the guide or a diagram.");
    }

    #[test]
    fn keeps_code_without_fences() {
        let out = run_pipeline("Run `make`:\n\n```sh\nmake install\n```\n");
        assert!(out.contains("Run make:"));
        assert!(out.contains("make install"));
        assert!(!out.contains("```"));
    }

    #[test]
    fn lists_and_quotes_lose_markers() {
        let out = run_pipeline("- one\n- two\n\n> quoted line\n");
        assert!(!out.contains('-'));
        assert!(!out.contains('>'));
        assert!(out.contains("one"));
        assert!(out.contains("quoted line"));
    }

    #[test]
    fn html_tags_are_removed() {
        let out = run_pipeline("<div class=\"note\">Heads up</div>\n\nInline <kbd>Ctrl</kbd>.");
        assert!(out.contains("Heads up"));
        assert!(out.contains("Inline Ctrl."));
        assert!(!out.contains('<'));
    }

    #[test]
    fn blank_lines_collapse() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
    }
}
