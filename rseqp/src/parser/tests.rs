use super::*;
use crate::config::ImageMode;
use crate::dedup::dedupe_with_report;
use crate::errors::ExtractError;
use crate::models::{ImageMap, TopicKey};
use crate::test_utils::SampleDocument;

fn parse_sample(sample: SampleDocument) -> Extraction {
    parse(&sample.input(), &ExtractorConfig::new())
}

#[test_log::test]
fn test_parse_single_topic() {
    let extraction = parse_sample(SampleDocument::SingleTopic);
    let topics = &extraction.topics;

    assert_eq!(topics.keys(), vec![TopicKey::Numbered(1)]);
    let topic = topics.get(&TopicKey::Numbered(1)).unwrap();
    assert_eq!(topic.topic_name, "Networking");
    assert_eq!(topic.case_study_text, "");
    assert_eq!(topic.questions.len(), 1);

    let question = &topic.questions[0];
    assert_eq!(question.question_number, "1");
    assert_eq!(question.question_text, "What is TCP?");
    assert_eq!(question.options, vec!["A. Protocol", "B. Cable"]);
    assert_eq!(question.answer, vec!["A"]);
    assert_eq!(question.explanation_text, "TCP is a protocol.");
    assert!(extraction.diagnostics.is_empty());
}

#[test_log::test]
fn test_parse_removes_duplicates_across_topics() {
    let extraction = parse_sample(SampleDocument::DuplicateQuestions);
    let topics = &extraction.topics;

    let first = topics.get(&TopicKey::Numbered(1)).unwrap();
    assert_eq!(first.questions.len(), 1);
    assert_eq!(first.questions[0].question_text, "What is TCP?");
    assert_eq!(first.questions[0].options, vec!["A. Protocol", "B. Cable"]);

    let second = topics.get(&TopicKey::Numbered(2)).unwrap();
    let texts: Vec<&str> = second.questions.iter().map(|q| q.question_text.as_str()).collect();
    assert_eq!(texts, vec!["What is DNS?"]);

    assert_eq!(
        extraction.diagnostics,
        vec![Diagnostic::DuplicateRemoved {
            topic: "topic2".to_string(),
            question_number: "1".to_string(),
            preview: "WHAT IS TCP?".to_string(),
        }]
    );
}

#[test]
fn test_parse_keeps_unresolved_placeholder() {
    let extraction = parse_sample(SampleDocument::UnresolvedImage);
    let topic = extraction.topics.get(&TopicKey::Ungrouped).unwrap();
    let question = &topic.questions[0];

    assert!(question.question_text.contains("%%IMAGE_9%%"));
    assert!(question.question_images.is_empty());
    assert_eq!(question.explanation_text, "See");
    assert_eq!(question.explanation_images, vec!["https://cdn.example/exhibit-0.png"]);
    assert_eq!(extraction.images, vec!["https://cdn.example/exhibit-0.png"]);
}

#[test]
fn test_parse_without_headers() {
    let extraction = parse_sample(SampleDocument::NoHeaders);
    let topics = &extraction.topics;

    assert_eq!(topics.keys(), vec![TopicKey::Ungrouped]);
    let topic = topics.get(&TopicKey::Ungrouped).unwrap();
    assert_eq!(topic.topic_name, "");
    let numbers: Vec<&str> = topic.questions.iter().map(|q| q.question_number.as_str()).collect();
    // document order, not numeric order
    assert_eq!(numbers, vec!["1", "2", "1"]);
    assert_eq!(topic.questions[2].answer, vec!["A", "C"]);
    assert_eq!(topic.questions[2].options.len(), 3);
}

#[test_log::test]
fn test_parse_mixed_exam() {
    let extraction = parse_sample(SampleDocument::MixedExam);
    let topics = &extraction.topics;

    assert_eq!(
        topics.keys(),
        vec![TopicKey::Ungrouped, TopicKey::Numbered(1), TopicKey::Numbered(2)]
    );

    // leading question before the first header, banner lines removed
    let leading = topics.get(&TopicKey::Ungrouped).unwrap();
    assert_eq!(leading.topic_name, "");
    assert_eq!(leading.questions.len(), 1);
    assert_eq!(leading.questions[0].question_text, "Which layer does IP belong to?");

    let networking = topics.get(&TopicKey::Numbered(1)).unwrap();
    assert_eq!(networking.topic_name, "Networking Basics");
    assert_eq!(networking.questions.len(), 2);
    let router = &networking.questions[0];
    assert_eq!(router.question_text, "Refer to the exhibit.\nWhat does the router do?");
    assert_eq!(router.question_images, vec!["https://cdn.example/router.png"]);
    assert_eq!(router.explanation_text, "Routers forward packets.");
    assert_eq!(router.explanation_images, vec!["https://cdn.example/packets.png"]);
    // watermark block between questions 2 and 3 is gone
    let dns = &networking.questions[1];
    assert_eq!(dns.question_text, "Which protocol resolves names?");
    assert!(!router.explanation_text.contains("Exam Dumps"));

    let case_study = topics.get(&TopicKey::Numbered(2)).unwrap();
    assert_eq!(case_study.topic_name, "Case Study 2");
    assert_eq!(case_study.case_study_text, "Overview\nContoso is a consulting company.");
    assert_eq!(case_study.case_study_images, vec!["https://cdn.example/contoso.png"]);
    let numbers: Vec<&str> =
        case_study.questions.iter().map(|q| q.question_number.as_str()).collect();
    // question 5 repeats question 3 and is dropped
    assert_eq!(numbers, vec!["4", "6"]);
    assert_eq!(case_study.questions[0].answer, vec!["A", "B"]);
    assert_eq!(case_study.questions[1].question_text, "");
    assert_eq!(case_study.questions[1].explanation_text, "Describe the network.");

    assert_eq!(
        extraction.images,
        vec![
            "https://cdn.example/router.png",
            "https://cdn.example/packets.png",
            "https://cdn.example/contoso.png",
        ]
    );
    assert_eq!(
        extraction.diagnostics,
        vec![
            Diagnostic::ExplanationWithoutAnswer {
                question_number: "6".to_string()
            },
            Diagnostic::DuplicateRemoved {
                topic: "topic2".to_string(),
                question_number: "5".to_string(),
                preview: "which protocol resolves names?".to_string(),
            },
        ]
    );
}

#[test]
fn test_trailing_questions_go_to_general_topic() {
    let text = "Topic 1, Basics\nQuestion: 1\nIn topic?\nA. x\nB. y\nAnswer: A\n";
    let segments = locate_segments(text);
    let mut questions = locate_questions(text);
    // a question located past the last segment span
    let tail = "Question: 2\nAfter every topic?\nAnswer: B\n";
    let extended = format!("{}{}", text, tail);
    questions.push(QuestionMatch {
        number: "2".to_string(),
        start: extended.len() - tail.len() + 1,
        content_start: extended.len() - tail.len() + "Question: 2\n".len(),
        end: extended.len(),
        content: "After every topic?\nAnswer: B\n",
    });
    let images = ImageMap::new();
    let resolver = ImageResolver::new(&images, ImageMode::Placeholder);

    let result = assemble(&segments, &questions, &resolver, "topic");
    assert_eq!(result.keys(), vec![TopicKey::Ungrouped, TopicKey::Numbered(1)]);
    let general = result.get(&TopicKey::Ungrouped).unwrap();
    assert_eq!(general.topic_name, TRAILING_TOPIC_NAME);
    assert_eq!(general.questions.len(), 1);
    assert_eq!(general.questions[0].answer, vec!["B"]);
}

#[test]
fn test_colliding_ordinals_merge() {
    let text = "Question: 1\nBefore?\nAnswer: A\n\
                Topic 0, Intro\nQuestion: 2\nIntro question?\nAnswer: B\n\
                Topic 1, Basics\nQuestion: 3\nBasics?\nAnswer: C\n\
                Topic 1, Basics again\nQuestion: 4\nMore basics?\nAnswer: D\n";
    let extraction = parse(&DocumentInput::from_text(text), &ExtractorConfig::new());
    let topics = &extraction.topics;

    assert_eq!(topics.keys(), vec![TopicKey::Ungrouped, TopicKey::Numbered(1)]);
    let ungrouped = topics.get(&TopicKey::Ungrouped).unwrap();
    assert_eq!(ungrouped.topic_name, "Intro");
    let numbers: Vec<&str> = ungrouped.questions.iter().map(|q| q.question_number.as_str()).collect();
    assert_eq!(numbers, vec!["1", "2"]);

    let basics = topics.get(&TopicKey::Numbered(1)).unwrap();
    assert_eq!(basics.topic_name, "Basics");
    assert_eq!(basics.questions.len(), 2);
}

#[test]
fn test_segment_questions_agree_with_global_offsets() {
    for sample in SampleDocument::ALL {
        let input = sample.input();
        let config = ExtractorConfig::new();
        let text = normalized_text(&input, &config);
        let segments = locate_segments(&text);
        let global = locate_questions(&text);

        for segment in segments.iter() {
            let local: Vec<(usize, String)> = locate_questions(segment.content)
                .iter()
                .map(|q| (q.start + segment.content_start, q.number.clone()))
                .collect();
            let owned: Vec<(usize, String)> = global
                .iter()
                .filter(|q| segment.owns(q.start))
                .map(|q| (q.start, q.number.clone()))
                .collect();
            assert_eq!(local, owned, "sample {} segment {}", sample, segment.ordinal);
        }
    }
}

#[test]
fn test_question_count_matches_headers_minus_duplicates() {
    for sample in SampleDocument::ALL {
        let input = sample.input();
        let config = ExtractorConfig::new();
        let text = normalized_text(&input, &config);
        let header_count = locate_questions(&text).len();

        let extraction = parse(&input, &config);
        let removed = extraction
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::DuplicateRemoved { .. }))
            .count();
        assert_eq!(
            extraction.topics.question_count(),
            header_count - removed,
            "sample {}",
            sample
        );
    }
}

#[test]
fn test_answer_labels_are_single_letters() {
    for sample in SampleDocument::ALL {
        let extraction = parse_sample(sample);
        for (_, question) in extraction.topics.questions() {
            for label in question.answer.iter() {
                assert_eq!(label.chars().count(), 1, "sample {}", sample);
                assert!(("A"..="G").contains(&label.as_str()), "sample {}", sample);
            }
        }
    }
}

#[test]
fn test_no_resolvable_placeholder_left() {
    for sample in SampleDocument::ALL {
        let input = sample.input();
        let extraction = parse(&input, &ExtractorConfig::new());
        let resolver = ImageResolver::new(&input.images, ImageMode::Placeholder);
        for (_, topic) in extraction.topics.iter() {
            assert!(!resolver.has_resolvable_token(&topic.case_study_text));
            for question in topic.questions.iter() {
                assert!(!resolver.has_resolvable_token(&question.question_text));
                assert!(!resolver.has_resolvable_token(&question.explanation_text));
                assert!(!resolver.has_resolvable_token(&question.answer_text));
                for option in question.options.iter() {
                    assert!(!resolver.has_resolvable_token(option));
                }
            }
        }
    }
}

#[test]
fn test_option_line_image_is_resolved() {
    let lines = ["Question: 1", "Pick the diagram", "A. %%IMAGE_0%%", "B. none", "Answer: A"];
    let images: ImageMap = [("%%IMAGE_0%%", "https://cdn.example/diagram.png")].into_iter().collect();
    let input = DocumentInput::new(lines.iter().map(|l| l.to_string()).collect(), images);
    let extraction = parse(&input, &ExtractorConfig::new());

    let topic = extraction.topics.get(&TopicKey::Ungrouped).unwrap();
    let question = &topic.questions[0];
    assert_eq!(question.options, vec!["A.", "B. none"]);
    assert_eq!(question.question_images, vec!["https://cdn.example/diagram.png"]);
    assert_eq!(extraction.images, vec!["https://cdn.example/diagram.png"]);
}

#[test]
fn test_dedupe_after_parse_is_idempotent() {
    for sample in SampleDocument::ALL {
        let extraction = parse_sample(sample);
        let (again, removed) = dedupe_with_report(extraction.topics.clone());
        assert_eq!(again, extraction.topics);
        assert!(removed.is_empty());
    }
}

/// Answers are not checked against options; this only records how often they disagree.
#[test_log::test]
fn test_answer_option_mismatch_rate_is_recorded() {
    let mut total = 0usize;
    let mut mismatched = 0usize;
    for sample in SampleDocument::ALL {
        let extraction = parse_sample(sample);
        for (_, question) in extraction.topics.questions() {
            if question.options.is_empty() || question.answer.is_empty() {
                continue;
            }
            total += 1;
            let labels = question.option_labels();
            if question.answer.iter().any(|a| !labels.contains(a)) {
                mismatched += 1;
            }
        }
    }
    tracing::info!("answer/option mismatch: {}/{}", mismatched, total);
    assert!(total > 0);
}

#[test]
fn test_parse_json_rejects_invalid_image_map() {
    let err = parse_json(r#"{"lines": ["Question: 1"], "images": "x.png"}"#, &ExtractorConfig::new())
        .unwrap_err();
    assert!(matches!(err, ExtractError::InvalidInput { ref field, .. } if field == "images"));
}

#[test]
fn test_parse_json_sample() {
    let raw = SampleDocument::MixedExam.to_json();
    let extraction = parse_json(&raw, &ExtractorConfig::new()).unwrap();
    assert_eq!(extraction.topics.question_count(), 5);

    let value: serde_json::Value = serde_json::from_str(&extraction2json(&extraction)).unwrap();
    let question = &value["result"]["topic1"]["questions"][0];
    assert_eq!(question["question_number"], "2");
    assert_eq!(question["answer"], serde_json::json!(["A"]));
    assert_eq!(value["result"]["topic2"]["topic_name"], "Case Study 2");
    assert!(value.get("diagnostics").is_none());
}

#[test]
fn test_dedupe_can_be_disabled() {
    let config = ExtractorConfig {
        dedupe: false,
        ..ExtractorConfig::new()
    };
    let extraction = parse(&SampleDocument::DuplicateQuestions.input(), &config);
    assert_eq!(extraction.topics.question_count(), 3);
}

#[test]
fn test_html_tag_images() {
    let mut images = ImageMap::new();
    images.insert("net.png", "https://cdn.example/net.png");
    let input = DocumentInput::new(
        vec![
            "Question: 1".to_string(),
            "Look <img src='net.png'>".to_string(),
            "A. a".to_string(),
            "B. b".to_string(),
            "Answer: A".to_string(),
        ],
        images,
    );
    let config = ExtractorConfig {
        image_mode: ImageMode::HtmlTag,
        ..ExtractorConfig::new()
    };
    let extraction = parse(&input, &config);
    let question = &extraction.topics.get(&TopicKey::Ungrouped).unwrap().questions[0];
    assert_eq!(question.question_text, "Look");
    assert_eq!(question.question_images, vec!["https://cdn.example/net.png"]);
}

#[test_log::test]
fn test_questions_without_text_are_deduplicated() {
    let text = "Question: 1\nExplanation\nQuestion: 2\nExplanation\n";
    let extraction = parse(&DocumentInput::from_text(text), &ExtractorConfig::new());

    assert_eq!(extraction.topics.question_count(), 1);
    let removed: Vec<&Diagnostic> = extraction
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::DuplicateRemoved { .. }))
        .collect();
    assert_eq!(removed.len(), 1);
    assert!(matches!(
        removed[0],
        Diagnostic::DuplicateRemoved { question_number, .. } if question_number == "2"
    ));
}

#[test]
fn test_new_question_headers() {
    let text = "NEW QUESTION 1\nWhat is TCP?\nA. x\nB. y\nAnswer: A\nNEW QUESTION 2\nWhat is UDP?\nA. x\nB. y\nAnswer: B\n";
    let extraction = parse(&DocumentInput::from_text(text), &ExtractorConfig::new());

    assert_eq!(extraction.topics.question_count(), 2);
    let topic = extraction.topics.get(&TopicKey::Ungrouped).unwrap();
    assert_eq!(topic.questions[0].question_text, "What is TCP?");
    assert_eq!(topic.questions[1].answer, vec!["B"]);
}
