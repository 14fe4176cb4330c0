//! Header location over the normalized document text.
//!
//! Two header families open a segment: `Topic <N>, <name>` and
//! `Case Study: <N>`. Question headers (`Question: <N>`, `NEW QUESTION 12`, ...)
//! open a question. A segment runs until the next segment header; a question
//! runs until the next question or segment header. The `regex` crate has no
//! lookahead, so the terminators are computed from the ordered header starts.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::TopicKey;

static TOPIC_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:Topic|TOPIC)[ \t]+(\d{1,9})[ \t]*[,:\-][ \t]*(.*?)[ \t]*$").unwrap()
});

static CASE_STUDY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:Case Study|CASE STUDY)[ \t]*[:\-][ \t]*(\d{1,9})[ \t]*$").unwrap()
});

static QUESTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:new[ \t]+)?question[ \t]*(?:(?:no\.?|#)[ \t]*)?[:.\-]?[ \t]*(\d{1,6})[ \t]*[:.)]?[ \t]*$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Topic,
    CaseStudy,
}

/// A topic or case-study header together with the span it owns.
///
/// # Fields
///
/// * `kind` - Which header family matched.
/// * `ordinal` - The number in the header.
/// * `display_name` - Captured topic name, or `Case Study <N>`.
/// * `start` - Byte offset of the header line.
/// * `content_start` - Byte offset right after the header line.
/// * `end` - Byte offset of the next segment header, or the end of the text.
/// * `content` - `text[content_start..end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMatch<'t> {
    pub kind: SegmentKind,
    pub ordinal: u32,
    pub display_name: String,
    pub start: usize,
    pub content_start: usize,
    pub end: usize,
    pub content: &'t str,
}

impl<'t> SegmentMatch<'t> {
    pub fn key(&self) -> TopicKey {
        TopicKey::from_ordinal(self.ordinal)
    }

    /// `true` if `offset` falls inside the content span of this segment.
    pub fn owns(&self, offset: usize) -> bool {
        self.content_start <= offset && offset < self.end
    }
}

/// A question header together with the text it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionMatch<'t> {
    pub number: String,
    pub start: usize,
    pub content_start: usize,
    pub end: usize,
    pub content: &'t str,
}

struct Header {
    kind: SegmentKind,
    ordinal: u32,
    name: String,
    start: usize,
    header_end: usize,
}

fn segment_headers(text: &str) -> Vec<Header> {
    let mut headers = Vec::new();
    for caps in TOPIC_HEADER.captures_iter(text) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Ok(ordinal) = number.as_str().parse::<u32>() else {
            continue;
        };
        headers.push(Header {
            kind: SegmentKind::Topic,
            ordinal,
            name: caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
            start: whole.start(),
            header_end: whole.end(),
        });
    }
    for caps in CASE_STUDY_HEADER.captures_iter(text) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Ok(ordinal) = number.as_str().parse::<u32>() else {
            continue;
        };
        headers.push(Header {
            kind: SegmentKind::CaseStudy,
            ordinal,
            name: format!("Case Study {}", ordinal),
            start: whole.start(),
            header_end: whole.end(),
        });
    }
    headers.sort_by_key(|h| h.start);
    headers
}

/// Skips the line break that ends a header line.
fn after_header_line(text: &str, header_end: usize) -> usize {
    if text[header_end..].starts_with("\r\n") {
        header_end + 2
    } else if text[header_end..].starts_with('\n') {
        header_end + 1
    } else {
        header_end
    }
}

/// Finds topic and case-study segments in document order.
///
/// Each segment owns the text from the end of its header line up to the next
/// header of either family (or the end of the text), so spans never overlap.
pub fn locate_segments(text: &str) -> Vec<SegmentMatch<'_>> {
    let headers = segment_headers(text);
    let mut segments = Vec::with_capacity(headers.len());
    for (idx, header) in headers.iter().enumerate() {
        let end = headers.get(idx + 1).map(|next| next.start).unwrap_or(text.len());
        let content_start = usize::min(after_header_line(text, header.header_end), end);
        segments.push(SegmentMatch {
            kind: header.kind,
            ordinal: header.ordinal,
            display_name: header.name.clone(),
            start: header.start,
            content_start,
            end,
            content: &text[content_start..end],
        });
    }
    segments
}

/// Finds question headers in `text` in document order.
///
/// A question runs until the next question header, the next topic/case-study
/// header, or the end of `text`. Offsets are relative to `text`.
pub fn locate_questions(text: &str) -> Vec<QuestionMatch<'_>> {
    let mut boundaries: Vec<usize> = segment_headers(text).iter().map(|h| h.start).collect();
    let mut headers = Vec::new();
    for caps in QUESTION_HEADER.captures_iter(text) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        boundaries.push(whole.start());
        headers.push((number.as_str().to_string(), whole.start(), whole.end()));
    }
    boundaries.sort_unstable();

    headers
        .into_iter()
        .map(|(number, start, header_end)| {
            let end = boundaries.iter().copied().find(|&b| b > start).unwrap_or(text.len());
            let content_start = usize::min(after_header_line(text, header_end), end);
            QuestionMatch {
                number,
                start,
                content_start,
                end,
                content: &text[content_start..end],
            }
        })
        .collect()
}

/// Byte offset of the first question header in `text`, if any.
pub fn first_question_start(text: &str) -> Option<usize> {
    QUESTION_HEADER.find(text).map(|m| m.start())
}
