use strum::Display;

use crate::models::{DocumentInput, ImageMap};

/// Built-in sample documents (lines as the upstream extractor emits them).
#[derive(Copy, Clone, Debug, Display)]
pub enum SampleDocument {
    SingleTopic,
    DuplicateQuestions,
    UnresolvedImage,
    NoHeaders,
    MixedExam,
}

impl SampleDocument {
    pub const ALL: [SampleDocument; 5] = [
        SampleDocument::SingleTopic,
        SampleDocument::DuplicateQuestions,
        SampleDocument::UnresolvedImage,
        SampleDocument::NoHeaders,
        SampleDocument::MixedExam,
    ];

    pub fn text(&self) -> &'static str {
        match self {
            SampleDocument::SingleTopic => {
                "Topic 1, Networking\n\
                 Question: 1\n\
                 What is TCP?\n\
                 A. Protocol\n\
                 B. Cable\n\
                 Answer: A\n\
                 Explanation: TCP is a protocol.\n"
            }
            SampleDocument::DuplicateQuestions => {
                "Topic 1, Networking\n\
                 Question: 1\n\
                 What is TCP?\n\
                 A. Protocol\n\
                 B. Cable\n\
                 Answer: A\n\
                 Topic 2, Review\n\
                 Question: 1\n\
                 WHAT IS TCP?\n\
                 A. A protocol\n\
                 B. A cable\n\
                 Answer: A\n\
                 Question: 2\n\
                 What is DNS?\n\
                 A. Naming\n\
                 B. Routing\n\
                 Answer: A\n"
            }
            SampleDocument::UnresolvedImage => {
                "Question: 1\n\
                 Refer to the exhibit. %%IMAGE_9%%\n\
                 Which port is blocked?\n\
                 A. 22\n\
                 B. 443\n\
                 Answer: B\n\
                 Explanation: See %%IMAGE_0%%\n"
            }
            SampleDocument::NoHeaders => {
                "QUESTION 1\n\
                 First question?\n\
                 A. yes\n\
                 B. no\n\
                 Correct Answer: A\n\
                 QUESTION 2\n\
                 Second question?\n\
                 A. yes\n\
                 B. no\n\
                 Correct Answer: B\n\
                 QUESTION 1\n\
                 Third question with a repeated number?\n\
                 A. yes\n\
                 B. no\n\
                 C. maybe\n\
                 Correct Answer: AC\n"
            }
            SampleDocument::MixedExam => {
                "Vendor Questions and Answers PDF\n\
                 1/12\n\
                 Question: 1\n\
                 Which layer does IP belong to?\n\
                 A. Network\n\
                 B. Transport\n\
                 Answer: A\n\
                 Topic 1, Networking Basics\n\
                 Question: 2\n\
                 Refer to the exhibit. %%IMAGE_0%%\n\
                 What does the router do?\n\
                 A. Forwards packets\n\
                 B. Stores files\n\
                 C. Prints pages\n\
                 Answer: A\n\
                 Explanation: Routers forward packets. %%IMAGE_1%%\n\
                 Vendor Exam Dumps\n\
                 Networking Certification\n\
                 2\n\
                 WWW.CERTS.COM\n\
                 Question: 3\n\
                 Which protocol resolves names?\n\
                 A. DNS\n\
                 B. ARP\n\
                 Answer: A\n\
                 Case Study: 2\n\
                 Contoso, Ltd\n\
                 Overview\n\
                 Contoso is a consulting company. %%IMAGE_2%%\n\
                 Question: 4\n\
                 Which two services should Contoso deploy?\n\
                 A. DHCP\n\
                 B. DNS\n\
                 C. FTP\n\
                 D. Telnet\n\
                 Answer: A B\n\
                 Explanation: Both are required.\n\
                 Question: 5\n\
                 which protocol resolves names?\n\
                 A. DNS\n\
                 B. NTP\n\
                 Answer: A\n\
                 Question: 6\n\
                 Describe the network.\n\
                 Explanation\n"
            }
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(|l| l.to_string()).collect()
    }

    pub fn images(&self) -> ImageMap {
        match self {
            SampleDocument::UnresolvedImage => {
                [("%%IMAGE_0%%", "https://cdn.example/exhibit-0.png")].into_iter().collect()
            }
            SampleDocument::MixedExam => [
                ("%%IMAGE_0%%", "https://cdn.example/router.png"),
                ("%%IMAGE_1%%", "https://cdn.example/packets.png"),
                ("%%IMAGE_2%%", "https://cdn.example/contoso.png"),
            ]
            .into_iter()
            .collect(),
            _ => ImageMap::new(),
        }
    }

    pub fn input(&self) -> DocumentInput {
        DocumentInput::new(self.lines(), self.images())
    }

    /// The sample as the JSON document the CLI reads.
    pub fn to_json(&self) -> String {
        let images: serde_json::Map<String, serde_json::Value> = self
            .images()
            .iter()
            .map(|(token, reference)| (token.to_string(), serde_json::Value::from(reference)))
            .collect();
        serde_json::json!({ "lines": self.lines(), "images": images }).to_string()
    }
}
