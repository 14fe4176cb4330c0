//! # RuSt Exam Question Parser (rseqp)
//!
//! The `rseqp` library turns the text lines of an exported exam-question
//! document into a structured catalogue of topics, questions, options,
//! answers, explanations and images.
//!
//! ## Quick Start
//!
//! To start using the `rseqp` library, add it to your project's dependencies in the `Cargo.toml` file:
//!
//! ```bash
//! cargo add rseqp
//! ```
//!
//! ## Examples
//!
//! Lines and images come from an upstream extraction step; the parser only
//! works on text.
//!
//! ```rust
//! # use rseqp::config::ExtractorConfig;
//! # use rseqp::models::{DocumentInput, TopicKey};
//! # use rseqp::parser::parse;
//! let text = "Topic 1, Networking\nQuestion: 1\nWhat is TCP?\nA. Protocol\nB. Cable\nAnswer: A\n";
//! let input = DocumentInput::from_text(text);
//! let extraction = parse(&input, &ExtractorConfig::new());
//! let topic = extraction.topics.get(&TopicKey::Numbered(1)).unwrap();
//! assert_eq!(topic.questions[0].answer, vec!["A"]);
//! let json = extraction.to_json(); // {"result": {"topic1": {...}}, "images": []}
//! # assert!(json.contains("topic1"));
//! ```
//!
//! ## Tests
//!
//! ```sh
//! cargo test
//! ```

pub mod cleaner;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod images;
pub mod models;
pub mod parser;
pub mod test_utils;
