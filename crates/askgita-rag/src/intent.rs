//! Cheap lexical detection of greetings and thanks.
//!
//! Input is lowercased, trimmed, stripped of leading/trailing punctuation and
//! emoji, and whitespace-collapsed. Under [`MatchPolicy::Exact`] (the default)
//! the whole normalized input must equal a keyword; [`MatchPolicy::Contains`]
//! accepts any keyword occurring as a substring, which also catches "hi" in
//! "this" and "great" in "that's great news".

use askgita_core::types::{Intent, MatchPolicy};

use crate::reply::Reply;

pub const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "hey", "good morning", "good evening", "namaste"];
pub const THANKS_KEYWORDS: &[&str] = &["thank", "thanks", "thank you", "great", "awesome", "good job", "nice"];

pub const SAMPLE_QUESTIONS: [&str; 4] = [
    "How to control the mind?",
    "What is the path to peace according to the Gita?",
    "How to deal with fear and anxiety?",
    "What is Karma Yoga?",
];

const GREETING_REPLY: &str = "Namaste 🙏 How can I assist you today with the wisdom of the Gita?";
const GREETING_SUGGESTIONS: &str = "Here are a few things you can ask:";
const THANKS_REPLY: &str = "You're most welcome 🙏 May your path be full of clarity and peace.";
const THANKS_SUGGESTIONS: &str = "Would you like to explore more? Try asking something like:";

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier { policy: MatchPolicy }

impl IntentClassifier {
    pub fn new(policy: MatchPolicy) -> Self { Self { policy } }

    pub fn policy(&self) -> MatchPolicy { self.policy }

    /// Greetings win over thanks when both would match.
    pub fn classify(&self, input: &str) -> Intent {
        let normalized = normalize(input);
        if self.matches(&normalized, GREETING_KEYWORDS) {
            Intent::Greeting
        } else if self.matches(&normalized, THANKS_KEYWORDS) {
            Intent::Thanks
        } else {
            Intent::Question
        }
    }

    fn matches(&self, normalized: &str, keywords: &[&str]) -> bool {
        match self.policy {
            MatchPolicy::Exact => keywords.iter().any(|k| *k == normalized),
            MatchPolicy::Contains => keywords.iter().any(|k| normalized.contains(k)),
        }
    }
}

pub fn normalize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| !c.is_alphanumeric());
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The fixed reply for a short-circuited intent; `None` for questions.
pub fn canned_reply(intent: Intent) -> Option<Reply> {
    let (message, heading) = match intent {
        Intent::Greeting => (GREETING_REPLY, GREETING_SUGGESTIONS),
        Intent::Thanks => (THANKS_REPLY, THANKS_SUGGESTIONS),
        Intent::Question => return None,
    };
    Some(Reply::Canned {
        intent,
        message: message.to_string(),
        suggestions_heading: heading.to_string(),
        suggestions: SAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
    })
}
