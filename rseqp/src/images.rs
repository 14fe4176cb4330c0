//! Image placeholder reconciliation.
//!
//! Replaces inline image tokens with resolved references. Tokens that the
//! mapping does not know stay in the text so broken links remain visible.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::ImageMode;
use crate::models::ImageMap;

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%IMAGE_\d+%%").unwrap());

/// `<img src='...'>`, `<img src="...">`, optionally self-closing.
static IMG_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*(?:'([^']*)'|"([^"]*)")[^>]*>"#).unwrap()
});

/// Resolves image tokens of one document against its `ImageMap`.
#[derive(Debug, Clone, Copy)]
pub struct ImageResolver<'a> {
    images: &'a ImageMap,
    mode: ImageMode,
}

impl<'a> ImageResolver<'a> {
    pub fn new(images: &'a ImageMap, mode: ImageMode) -> ImageResolver<'a> {
        ImageResolver { images, mode }
    }

    fn lookup(&self, caps: &regex::Captures) -> Option<&'a str> {
        let token = caps.get(0)?.as_str();
        match self.mode {
            ImageMode::Placeholder => self.images.get(token),
            ImageMode::HtmlTag => {
                let src = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
                src.and_then(|s| self.images.get(s)).or_else(|| self.images.get(token))
            }
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self.mode {
            ImageMode::Placeholder => &*PLACEHOLDER_PATTERN,
            ImageMode::HtmlTag => &*IMG_TAG_PATTERN,
        }
    }

    /// Strips resolvable tokens from `text` and returns the cleaned text with
    /// the resolved references in order of appearance.
    pub fn resolve(&self, text: &str) -> (String, Vec<String>) {
        if text.is_empty() {
            return (String::new(), Vec::new());
        }
        let mut refs = Vec::new();
        let mut cleaned = String::with_capacity(text.len());
        let mut last = 0;
        for caps in self.pattern().captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            match self.lookup(&caps) {
                Some(reference) => {
                    cleaned.push_str(&text[last..m.start()]);
                    refs.push(reference.to_string());
                    last = m.end();
                }
                None => {
                    tracing::debug!("Unresolved image token left in text: {}", m.as_str());
                }
            }
        }
        cleaned.push_str(&text[last..]);
        if refs.is_empty() {
            return (cleaned.trim().to_string(), refs);
        }
        // removed tokens leave trailing blanks behind
        let cleaned = cleaned.lines().map(|l| l.trim_end()).collect::<Vec<&str>>().join("\n");
        (cleaned.trim().to_string(), refs)
    }

    /// Returns `true` if `text` still holds a token the mapping could resolve.
    pub fn has_resolvable_token(&self, text: &str) -> bool {
        self.pattern().captures_iter(text).any(|caps| self.lookup(&caps).is_some())
    }
}
