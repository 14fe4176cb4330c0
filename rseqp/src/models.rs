use crate::errors::{ExtractError, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Mapping from an inline image token to its resolved, externally addressable reference.
///
/// Keys are the tokens as they appear in the text (e.g. `%%IMAGE_3%%`) or, for
/// html-tag documents, the `src` value of the tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMap {
    entries: HashMap<String, String>,
}

impl ImageMap {
    pub fn new() -> ImageMap {
        ImageMap::default()
    }

    /// The placeholder token the extractor emits for the image at `index`.
    pub fn placeholder(index: usize) -> String {
        format!("%%IMAGE_{}%%", index)
    }

    pub fn insert(&mut self, token: impl Into<String>, reference: impl Into<String>) {
        self.entries.insert(token.into(), reference.into());
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(|s| s.as_str())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Builds an `ImageMap` from the `images` field of an input document.
    ///
    /// Accepts either an object (`token -> reference`) or an array of
    /// references, where element `i` resolves `%%IMAGE_i%%`.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::InvalidInput` for any other JSON type, or when a
    /// reference is not a string.
    pub fn from_json_value(value: &Value) -> Result<ImageMap> {
        let mut map = ImageMap::new();
        match value {
            Value::Object(obj) => {
                for (token, reference) in obj {
                    let reference = reference.as_str().ok_or_else(|| {
                        ExtractError::invalid_input(
                            "images",
                            format!("reference for '{}' is not a string", token),
                        )
                    })?;
                    map.insert(token.clone(), reference);
                }
            }
            Value::Array(items) => {
                for (index, reference) in items.iter().enumerate() {
                    let reference = reference.as_str().ok_or_else(|| {
                        ExtractError::invalid_input(
                            "images",
                            format!("reference at index {} is not a string", index),
                        )
                    })?;
                    map.insert(ImageMap::placeholder(index), reference);
                }
            }
            Value::Null => {}
            other => {
                return Err(ExtractError::invalid_input(
                    "images",
                    format!("expected an object or an array, found {}", json_type_name(other)),
                ));
            }
        }
        Ok(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ImageMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ImageMap::new();
        for (token, reference) in iter {
            map.insert(token, reference);
        }
        map
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One extracted document as handed over by the upstream extraction stage.
///
/// # Fields
///
/// * `lines` - Text lines in document order, possibly holding image tokens.
/// * `images` - Resolution map for the image tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInput {
    pub lines: Vec<String>,
    pub images: ImageMap,
}

impl DocumentInput {
    pub fn new(lines: Vec<String>, images: ImageMap) -> DocumentInput {
        DocumentInput { lines, images }
    }

    /// Plain text document without images, one input line per text line.
    pub fn from_text(text: &str) -> DocumentInput {
        DocumentInput {
            lines: text.lines().map(|l| l.to_string()).collect(),
            images: ImageMap::new(),
        }
    }

    /// Parses `{ "lines": [...], "images": {...} | [...] }`.
    ///
    /// The whole shape is validated before any parsing of the content starts.
    pub fn from_json_str(raw: &str) -> Result<DocumentInput> {
        let value: Value = serde_json::from_str(raw)?;
        DocumentInput::from_json_value(&value)
    }

    pub fn from_json_value(value: &Value) -> Result<DocumentInput> {
        let obj = value.as_object().ok_or_else(|| {
            ExtractError::invalid_input(
                "document",
                format!("expected an object, found {}", json_type_name(value)),
            )
        })?;

        let lines = match obj.get("lines") {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_str().map(|s| s.to_string()).ok_or_else(|| {
                        ExtractError::invalid_input(
                            "lines",
                            format!("line {} is not a string", index),
                        )
                    })
                })
                .collect::<Result<Vec<String>>>()?,
            Some(Value::String(text)) => text.lines().map(|l| l.to_string()).collect(),
            Some(other) => {
                return Err(ExtractError::invalid_input(
                    "lines",
                    format!("expected an array of strings, found {}", json_type_name(other)),
                ));
            }
            None => return Err(ExtractError::invalid_input("lines", "field is missing")),
        };

        let images = match obj.get("images") {
            Some(value) => ImageMap::from_json_value(value)?,
            None => ImageMap::new(),
        };

        Ok(DocumentInput { lines, images })
    }
}

/// Identity of a topic inside one document.
///
/// Ordinal `0` and questions outside every header share the `Ungrouped` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKey {
    Ungrouped,
    Numbered(u32),
}

impl TopicKey {
    pub fn from_ordinal(ordinal: u32) -> TopicKey {
        if ordinal == 0 {
            TopicKey::Ungrouped
        } else {
            TopicKey::Numbered(ordinal)
        }
    }

    pub fn ordinal(&self) -> u32 {
        match self {
            TopicKey::Ungrouped => 0,
            TopicKey::Numbered(n) => *n,
        }
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ordinal())
    }
}

/// A single exam question.
///
/// # Fields
///
/// * `question_number` - The number printed in the question header.
/// * `question_text` - The question body, options excluded.
/// * `question_images` - Images referenced by the body, the option lines or a free-text answer.
/// * `options` - Options rendered as `"A. text"`, labels unique.
/// * `answer` - Answer labels (`"A"`..`"G"`), empty when none was found.
/// * `answer_text` - Free-text answer, when the answer line holds no labels.
/// * `explanation_text` - Explanation following the answer.
/// * `explanation_images` - Images referenced by the explanation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Question {
    pub question_number: String,
    pub question_text: String,
    pub question_images: Vec<String>,
    pub options: Vec<String>,
    pub answer: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub answer_text: String,
    pub explanation_text: String,
    pub explanation_images: Vec<String>,
}

impl Question {
    /// Key used to recognise the same question printed twice.
    pub fn dedup_key(&self) -> String {
        self.question_text.trim().to_lowercase()
    }

    pub fn has_answer(&self) -> bool {
        !self.answer.is_empty() || !self.answer_text.is_empty()
    }

    /// Labels of the options list, in order.
    pub fn option_labels(&self) -> Vec<String> {
        self.options
            .iter()
            .filter_map(|o| o.chars().next())
            .map(|c| c.to_string())
            .collect()
    }

    /// The first `limit` characters of the question text, for log lines.
    pub fn preview(&self, limit: usize) -> String {
        let mut preview: String = self.question_text.chars().take(limit).collect();
        if self.question_text.chars().count() > limit {
            preview.push_str("...");
        }
        preview
    }
}

/// A named group of questions, optionally introduced by a case study.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Topic {
    pub topic_name: String,
    pub case_study_text: String,
    pub case_study_images: Vec<String>,
    pub questions: Vec<Question>,
}

impl Topic {
    pub fn new(topic_name: impl Into<String>) -> Topic {
        Topic {
            topic_name: topic_name.into(),
            ..Topic::default()
        }
    }

    /// Folds a topic carrying the same ordinal into this one.
    fn merge(&mut self, other: Topic) {
        if self.topic_name.is_empty() {
            self.topic_name = other.topic_name;
        }
        if !other.case_study_text.is_empty() {
            if !self.case_study_text.is_empty() {
                self.case_study_text.push('\n');
            }
            self.case_study_text.push_str(&other.case_study_text);
        }
        self.case_study_images.extend(other.case_study_images);
        self.questions.extend(other.questions);
    }
}

/// Topics of one document, in the order they were first established.
///
/// The `Ungrouped` topic, when present, is always first.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentResult {
    key_prefix: String,
    topics: Vec<(TopicKey, Topic)>,
}

impl Default for DocumentResult {
    fn default() -> Self {
        DocumentResult::new("topic")
    }
}

impl DocumentResult {
    pub fn new(key_prefix: impl Into<String>) -> DocumentResult {
        DocumentResult {
            key_prefix: key_prefix.into(),
            topics: Vec::new(),
        }
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// The JSON key of a topic, e.g. `topic3`.
    pub fn json_key(&self, key: &TopicKey) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn get(&self, key: &TopicKey) -> Option<&Topic> {
        self.topics.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    pub fn get_mut(&mut self, key: &TopicKey) -> Option<&mut Topic> {
        self.topics.iter_mut().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    pub fn keys(&self) -> Vec<TopicKey> {
        self.topics.iter().map(|(k, _)| *k).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TopicKey, &Topic)> {
        self.topics.iter().map(|(k, t)| (k, t))
    }

    /// Inserts a topic, merging it into an existing topic with the same key.
    pub fn insert(&mut self, key: TopicKey, topic: Topic) {
        if let Some(existing) = self.get_mut(&key) {
            existing.merge(topic);
            return;
        }
        match key {
            TopicKey::Ungrouped => self.topics.insert(0, (key, topic)),
            TopicKey::Numbered(_) => self.topics.push((key, topic)),
        }
    }

    /// Returns the `Ungrouped` topic, creating it with `name` if absent.
    pub fn ungrouped_mut(&mut self, name: &str) -> &mut Topic {
        if self.get(&TopicKey::Ungrouped).is_none() {
            self.insert(TopicKey::Ungrouped, Topic::new(name));
        }
        // Ungrouped always sits at index 0.
        &mut self.topics[0].1
    }

    pub fn question_count(&self) -> usize {
        self.topics.iter().map(|(_, t)| t.questions.len()).sum()
    }

    /// All questions in topic order, then document order.
    pub fn questions(&self) -> impl Iterator<Item = (&TopicKey, &Question)> {
        self.topics
            .iter()
            .flat_map(|(k, t)| t.questions.iter().map(move |q| (k, q)))
    }

    /// Every resolved image reference in the result, first use first.
    pub fn image_refs(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut refs = Vec::new();
        for (_, topic) in self.topics.iter() {
            let question_refs = topic
                .questions
                .iter()
                .flat_map(|q| q.question_images.iter().chain(q.explanation_images.iter()));
            for reference in topic.case_study_images.iter().chain(question_refs) {
                if seen.insert(reference.clone()) {
                    refs.push(reference.clone());
                }
            }
        }
        refs
    }

    pub(crate) fn into_parts(self) -> (String, Vec<(TopicKey, Topic)>) {
        (self.key_prefix, self.topics)
    }

    pub(crate) fn from_parts(key_prefix: String, topics: Vec<(TopicKey, Topic)>) -> DocumentResult {
        DocumentResult { key_prefix, topics }
    }
}

impl Serialize for DocumentResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.topics.len()))?;
        for (key, topic) in self.topics.iter() {
            map.serialize_entry(&self.json_key(key), topic)?;
        }
        map.end()
    }
}

/// Suspicious but accepted conditions found while processing a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    DuplicateRemoved {
        topic: String,
        question_number: String,
        preview: String,
    },
    ExplanationWithoutAnswer {
        question_number: String,
    },
}

/// Final output of one document run.
///
/// # Fields
///
/// * `topics` - The topic catalogue, serialized as `result`.
/// * `images` - Every image reference used by the catalogue.
/// * `diagnostics` - Side-channel events, not part of the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    #[serde(rename = "result")]
    pub topics: DocumentResult,
    pub images: Vec<String>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
