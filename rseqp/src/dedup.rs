//! Cross-topic duplicate question removal.
//!
//! Walks the topics in document-result order and keeps the first question
//! for every normalized question text. The set of seen keys is shared by all
//! topics of one document.

use std::collections::HashSet;

use crate::models::{Diagnostic, DocumentResult, Question, TopicKey};

const PREVIEW_CHARS: usize = 50;

/// Removes duplicate questions and reports every removal.
///
/// Questions without text share the empty key, so only the first of them is
/// kept. Topics left without questions stay in the result.
pub fn dedupe_with_report(result: DocumentResult) -> (DocumentResult, Vec<Diagnostic>) {
    let (key_prefix, topics) = result.into_parts();

    let (topics, _, removed) = topics.into_iter().fold(
        (Vec::new(), HashSet::<String>::new(), Vec::<Diagnostic>::new()),
        |(mut kept, mut seen, mut removed), (key, mut topic)| {
            let questions = std::mem::take(&mut topic.questions);
            for question in questions {
                if seen.insert(question.dedup_key()) {
                    topic.questions.push(question);
                } else {
                    removed.push(report_duplicate(&key_prefix, &key, &question));
                }
            }
            kept.push((key, topic));
            (kept, seen, removed)
        },
    );

    if !removed.is_empty() {
        tracing::info!("Removed {} duplicate questions", removed.len());
    }
    (DocumentResult::from_parts(key_prefix, topics), removed)
}

/// Removes duplicate questions; removals are only logged.
pub fn dedupe(result: DocumentResult) -> DocumentResult {
    dedupe_with_report(result).0
}

fn report_duplicate(key_prefix: &str, key: &TopicKey, question: &Question) -> Diagnostic {
    let topic = format!("{}{}", key_prefix, key);
    let preview = question.preview(PREVIEW_CHARS);
    tracing::info!(
        "Removing duplicate question from {}: Q{} - {}",
        topic,
        question.question_number,
        preview
    );
    Diagnostic::DuplicateRemoved {
        topic,
        question_number: question.question_number.clone(),
        preview,
    }
}
