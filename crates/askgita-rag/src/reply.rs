use askgita_core::types::Intent;

/// What the user gets back for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Fixed response to a greeting or thanks, with suggested questions.
    Canned { intent: Intent, message: String, suggestions_heading: String, suggestions: Vec<String> },
    /// Model answer grounded in retrieved passages.
    Answer { text: String },
}

impl Reply {
    pub fn intent(&self) -> Intent {
        match self {
            Reply::Canned { intent, .. } => *intent,
            Reply::Answer { .. } => Intent::Question,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Reply::Canned { message, suggestions_heading, suggestions, .. } => {
                let list = suggestions.iter().map(|q| format!("- {}", q)).collect::<Vec<_>>().join("\n");
                format!("{}\n\n{}\n{}", message, suggestions_heading, list)
            }
            Reply::Answer { text } => text.clone(),
        }
    }
}
