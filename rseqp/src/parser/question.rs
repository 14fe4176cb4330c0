//! Question block extraction.
//!
//! A question block is split at its answer introducer into a body and a tail.
//! The body is scanned line by line by a small state machine that separates
//! question text from option runs; the tail yields the answer and explanation.

use regex::Regex;
use std::sync::LazyLock;

use crate::images::ImageResolver;
use crate::models::Question;
use crate::parser::segments::QuestionMatch;

/// `Correct Answer` with optional punctuation, or `Answer` followed by
/// punctuation or the end of the line, at the start of a line.
static ANSWER_INTRODUCER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:correct[ \t]+answers?[ \t]*[:.\-]?|answers?[ \t]*(?:[:.\-]|$))",
    )
    .unwrap()
});

static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-G])[.):\-][ \t]+(\S.*)$").unwrap());

/// `A`, `AB`, `A B`, `A, C`, `B/D`, `A and C`, optionally ending with a period.
static LABEL_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-G](?:(?:[ \t]*[,/&][ \t]*|[ \t]+and[ \t]+|[ \t]*)[A-G])*[ \t]*\.?$").unwrap()
});

static EXPLANATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[ \t]*explanation(?:[ \t]*/[ \t]*reference)?[ \t]*[:.\-]?[ \t]*").unwrap()
});

fn is_explanation_line(trimmed: &str) -> bool {
    trimmed.to_lowercase().starts_with("explanation")
}

fn strip_explanation_marker(text: &str) -> &str {
    match EXPLANATION_MARKER.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Splits a question block at its first answer introducer.
///
/// The tail starts right after the introducer and is empty when none is found.
pub fn split_answer(block: &str) -> (&str, &str) {
    match ANSWER_INTRODUCER.find(block) {
        Some(m) => (&block[..m.start()], &block[m.end()..]),
        None => (block, ""),
    }
}

/// An option-shaped line: label and option text.
pub fn parse_option_line(line: &str) -> Option<(char, String)> {
    let caps = OPTION_LINE.captures(line.trim())?;
    let label = caps.get(1)?.as_str().chars().next()?;
    let text = caps.get(2)?.as_str().trim().to_string();
    Some((label, text))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyState {
    Body,
    CollectingOptions,
    Explanation,
}

struct PendingOption {
    label: char,
    text: String,
    line: String,
}

/// Result of scanning a question body.
///
/// # Fields
///
/// * `text_lines` - Question text lines, including folded-back short option runs.
/// * `options` - The last option run with at least two lines, rendered `"A. text"`.
/// * `explanation_lines` - Lines after an `Explanation` line inside the body.
/// * `dangling_explanation` - The body ended with a bare `Explanation` line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyScan {
    pub text_lines: Vec<String>,
    pub options: Vec<String>,
    pub explanation_lines: Vec<String>,
    pub dangling_explanation: bool,
}

struct BodyScanner {
    state: BodyState,
    pending: Vec<PendingOption>,
    scan: BodyScan,
}

impl BodyScanner {
    fn new() -> BodyScanner {
        BodyScanner {
            state: BodyState::Body,
            pending: Vec::new(),
            scan: BodyScan::default(),
        }
    }

    /// Commits the pending run as the options list when it has at least two
    /// lines (replacing any earlier list), otherwise folds it back into the text.
    fn close_run(&mut self) {
        let run = std::mem::take(&mut self.pending);
        if run.len() >= 2 {
            if !self.scan.options.is_empty() {
                tracing::debug!(
                    "Replacing {} options with a later run of {}",
                    self.scan.options.len(),
                    run.len()
                );
            }
            self.scan.options =
                run.into_iter().map(|o| format!("{}. {}", o.label, o.text)).collect();
        } else {
            self.scan.text_lines.extend(run.into_iter().map(|o| o.line));
        }
    }

    fn feed(&mut self, line: &str) {
        let trimmed = line.trim();
        if self.state == BodyState::Explanation {
            self.scan.explanation_lines.push(trimmed.to_string());
            return;
        }
        if trimmed.is_empty() {
            return;
        }
        if is_explanation_line(trimmed) {
            self.close_run();
            self.state = BodyState::Explanation;
            let rest = strip_explanation_marker(trimmed).trim();
            if !rest.is_empty() {
                self.scan.explanation_lines.push(rest.to_string());
            }
            return;
        }
        match parse_option_line(trimmed) {
            Some((label, text)) => {
                if self.pending.iter().any(|o| o.label == label) {
                    self.close_run();
                }
                self.pending.push(PendingOption {
                    label,
                    text,
                    line: trimmed.to_string(),
                });
                self.state = BodyState::CollectingOptions;
            }
            None => {
                self.close_run();
                self.scan.text_lines.push(trimmed.to_string());
                self.state = BodyState::Body;
            }
        }
    }

    fn finish(mut self) -> BodyScan {
        self.close_run();
        if self.state == BodyState::Explanation {
            self.scan.dangling_explanation =
                self.scan.explanation_lines.iter().all(|l| l.trim().is_empty());
        }
        self.scan
    }
}

/// Runs the body state machine over the text before the answer introducer.
pub fn scan_body(body: &str) -> BodyScan {
    let mut scanner = BodyScanner::new();
    for line in body.lines() {
        scanner.feed(line);
    }
    scanner.finish()
}

/// Answer and explanation found in the tail of a question block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TailScan {
    pub labels: Vec<String>,
    pub free_text: String,
    pub explanation: String,
}

/// Letters of a label-shaped answer line, or `None` for free text.
pub fn answer_labels(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if !LABEL_ANSWER.is_match(line) {
        return None;
    }
    let mut labels: Vec<String> = Vec::new();
    for c in line.chars().filter(|c| ('A'..='G').contains(c)) {
        let label = c.to_string();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    Some(labels)
}

/// Reads the answer from the first non-blank tail line and keeps the rest as
/// explanation.
pub fn scan_tail(tail: &str) -> TailScan {
    let mut result = TailScan::default();
    let lines: Vec<&str> = tail.lines().collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return result;
    };

    let answer_line = lines[first].trim();
    let explanation_from = if is_explanation_line(answer_line) {
        first
    } else {
        match answer_labels(answer_line) {
            Some(labels) => result.labels = labels,
            None => result.free_text = answer_line.to_string(),
        }
        first + 1
    };

    let rest = lines[explanation_from..].join("\n");
    result.explanation = strip_explanation_marker(rest.trim_start()).trim().to_string();
    result
}

/// Builds a `Question` from one question header match.
pub fn extract(question_match: &QuestionMatch, resolver: &ImageResolver) -> Question {
    let (body, tail) = split_answer(question_match.content);
    let body_scan = scan_body(body);
    let tail_scan = scan_tail(tail);

    let mut body_text = body_scan.text_lines.join("\n");
    let body_explanation = body_scan.explanation_lines.join("\n");
    let mut explanation = [body_explanation.trim(), tail_scan.explanation.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("\n");

    let has_answer = !tail_scan.labels.is_empty() || !tail_scan.free_text.is_empty();
    if !has_answer && body_scan.dangling_explanation && explanation.is_empty() {
        explanation = std::mem::take(&mut body_text);
    }

    let (question_text, mut question_images) = resolver.resolve(&body_text);
    let (explanation_text, explanation_images) = resolver.resolve(&explanation);

    // images on option lines and in a free-text answer belong to the question
    let mut options = Vec::with_capacity(body_scan.options.len());
    for option in body_scan.options.iter() {
        let (text, refs) = resolver.resolve(option);
        question_images.extend(refs);
        options.push(text);
    }
    let (answer_text, answer_images) = resolver.resolve(&tail_scan.free_text);
    question_images.extend(answer_images);

    if !explanation_text.is_empty() && !has_answer {
        tracing::warn!(
            "Question {} has an explanation but no answer",
            question_match.number
        );
    }

    Question {
        question_number: question_match.number.clone(),
        question_text,
        question_images,
        options,
        answer: tail_scan.labels,
        answer_text,
        explanation_text,
        explanation_images,
    }
}
