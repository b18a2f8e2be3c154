//! Markdown stripping for speech input
//!
//! Article bodies arrive as markdown. Everything that would be read out as
//! punctuation noise is removed while the readable text is kept.

use once_cell::sync::Lazy;
use regex::Regex;

/// Spoken in place of a fenced code block
pub const CODE_BLOCK_PLACEHOLDER: &str = "[code block omitted]";

static FENCED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[\s\S]*?```").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*?\]\([^)]+?\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.+?)\]\(.+?\)").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+\s+").unwrap());
static HORIZONTAL_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[-*_]{3,}[ \t]*$").unwrap());
static BULLET_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+").unwrap());
static ORDERED_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d+\.[ \t]+").unwrap());
static BOLD_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static BOLD_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.+?)__").unwrap());
static ITALIC_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(.+?)_").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.+?)`").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n[\s]*").unwrap());

/// Strip markdown formatting so the text can be handed to a speech engine.
///
/// Never fails; empty input yields empty output. Passes run in an order where
/// earlier patterns cannot be mangled by later ones: fenced code goes first so
/// its backticks are not read as inline code, images before links so alt text
/// is dropped, rules and list markers before emphasis so their asterisks are
/// not taken as italics.
pub fn clean_markdown(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let text = FENCED_CODE.replace_all(markdown, CODE_BLOCK_PLACEHOLDER);
    let text = IMAGE.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = HORIZONTAL_RULE.replace_all(&text, "");
    let text = BULLET_MARKER.replace_all(&text, "");
    let text = ORDERED_MARKER.replace_all(&text, "");
    let text = BOLD_STARS.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = HTML_TAG.replace_all(&text, "");
    let text = BLANK_LINES.replace_all(&text, "\n");

    text.trim().to_string()
}
