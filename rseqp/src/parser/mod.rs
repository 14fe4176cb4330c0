use regex::Regex;
use std::sync::LazyLock;

use crate::cleaner;
use crate::config::ExtractorConfig;
use crate::dedup;
use crate::errors::Result;
use crate::images::ImageResolver;
use crate::models::{Diagnostic, DocumentInput, DocumentResult, Extraction, Topic};
use crate::parser::question::extract;
use crate::parser::segments::{first_question_start, locate_questions, locate_segments};
use crate::parser::segments::{QuestionMatch, SegmentMatch};

#[cfg(test)]
mod tests;

pub mod question;
pub mod segments;

/// Name of the ungrouped topic when it only collects questions found after
/// the last recognized segment.
pub const TRAILING_TOPIC_NAME: &str = "General Questions";

static CASE_STUDY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:overview|case study|general information)\b").unwrap()
});

/// Joins the normalized lines of a document into one text blob.
pub fn normalized_text(input: &DocumentInput, config: &ExtractorConfig) -> String {
    cleaner::normalize(&input.lines, &config.noise).join("\n")
}

/// Extracts the case-study description of a segment.
///
/// Looks for an overview / case study / general information marker before the
/// first question header and returns the text from the marker up to that
/// header. Returns empty text and no images when there is no marker.
pub fn case_study_text(content: &str, resolver: &ImageResolver) -> (String, Vec<String>) {
    let preamble_end = first_question_start(content).unwrap_or(content.len());
    let preamble = &content[..preamble_end];
    match CASE_STUDY_MARKER.find(preamble) {
        Some(m) => resolver.resolve(preamble[m.start()..].trim()),
        None => (String::new(), Vec::new()),
    }
}

fn segment_topic(segment: &SegmentMatch, resolver: &ImageResolver) -> Topic {
    let (case_study_text, case_study_images) = case_study_text(segment.content, resolver);
    let questions = locate_questions(segment.content)
        .iter()
        .map(|q| extract(q, resolver))
        .collect();
    Topic {
        topic_name: segment.display_name.clone(),
        case_study_text,
        case_study_images,
        questions,
    }
}

/// Stitches segments and gap questions into the topic map.
///
/// # Arguments
///
/// * `segments` - Topic/case-study segments in document order.
/// * `questions` - Question matches found over the whole text.
/// * `resolver` - Image resolver of the document.
/// * `key_prefix` - Prefix of the topic keys in the JSON output.
///
/// Questions of a segment are re-located inside the segment content. Global
/// questions before the first segment open the ungrouped topic; global
/// questions outside every segment after that are appended to it.
pub fn assemble(
    segments: &[SegmentMatch],
    questions: &[QuestionMatch],
    resolver: &ImageResolver,
    key_prefix: &str,
) -> DocumentResult {
    let mut result = DocumentResult::new(key_prefix);

    let Some(first) = segments.first() else {
        if !questions.is_empty() {
            let topic = result.ungrouped_mut("");
            topic.questions.extend(questions.iter().map(|q| extract(q, resolver)));
        }
        return result;
    };

    let leading: Vec<&QuestionMatch> =
        questions.iter().filter(|q| q.start < first.start).collect();
    if !leading.is_empty() {
        tracing::debug!("{} questions before the first topic header", leading.len());
        let topic = result.ungrouped_mut("");
        topic.questions.extend(leading.into_iter().map(|q| extract(q, resolver)));
    }

    for segment in segments {
        let topic = segment_topic(segment, resolver);
        tracing::debug!(
            "Segment {} '{}': {} questions",
            segment.ordinal,
            topic.topic_name,
            topic.questions.len()
        );
        result.insert(segment.key(), topic);
    }

    let trailing: Vec<&QuestionMatch> = questions
        .iter()
        .filter(|q| q.start >= first.start && !segments.iter().any(|s| s.owns(q.start)))
        .collect();
    if !trailing.is_empty() {
        tracing::debug!("{} questions outside every topic header", trailing.len());
        let topic = result.ungrouped_mut(TRAILING_TOPIC_NAME);
        topic.questions.extend(trailing.into_iter().map(|q| extract(q, resolver)));
    }

    result
}

fn explanation_diagnostics(result: &DocumentResult) -> Vec<Diagnostic> {
    result
        .questions()
        .filter(|(_, q)| !q.explanation_text.is_empty() && !q.has_answer())
        .map(|(_, q)| Diagnostic::ExplanationWithoutAnswer {
            question_number: q.question_number.clone(),
        })
        .collect()
}

/// Runs the whole pipeline on one document.
///
/// Normalizes the lines, locates segments and questions, assembles the topic
/// map and, unless disabled in `config`, removes duplicate questions.
pub fn parse(input: &DocumentInput, config: &ExtractorConfig) -> Extraction {
    let time = std::time::Instant::now();
    tracing::info!(
        "Parsing document: {} lines, {} images",
        input.lines.len(),
        input.images.len()
    );

    let text = normalized_text(input, config);
    let resolver = ImageResolver::new(&input.images, config.image_mode);

    let segments = locate_segments(&text);
    let questions = locate_questions(&text);
    tracing::info!(
        "Located {} topic headers and {} question headers",
        segments.len(),
        questions.len()
    );

    let assembled = assemble(&segments, &questions, &resolver, &config.topic_key_prefix);
    let mut diagnostics = explanation_diagnostics(&assembled);

    let topics = if config.dedupe {
        let (topics, removed) = dedup::dedupe_with_report(assembled);
        diagnostics.extend(removed);
        topics
    } else {
        assembled
    };

    let images = topics.image_refs();
    tracing::info!(
        "Finished parsing in {:.2}s: {} topics, {} questions",
        time.elapsed().as_secs_f64(),
        topics.len(),
        topics.question_count()
    );

    Extraction {
        topics,
        images,
        diagnostics,
    }
}

/// Validates a JSON document and runs the pipeline on it.
///
/// # Errors
///
/// Returns `ExtractError` if the document shape is invalid; nothing is parsed
/// in that case.
pub fn parse_json(raw: &str, config: &ExtractorConfig) -> Result<Extraction> {
    let input = DocumentInput::from_json_str(raw)?;
    Ok(parse(&input, config))
}

/// Converts an extraction to pretty-printed JSON.
pub fn extraction2json(extraction: &Extraction) -> String {
    extraction.to_json()
}
