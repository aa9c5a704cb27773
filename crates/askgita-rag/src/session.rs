use std::fmt;
use std::sync::Arc;

use askgita_core::error::Result;

use crate::pipeline::AskGita;
use crate::reply::Reply;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    You,
    GitaAi,
    System,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Speaker::You => "You",
            Speaker::GitaAi => "Gita AI",
            Speaker::System => "System",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub message: String,
}

/// One user's visible conversation. The transcript is for display only and
/// is never fed back into the pipeline.
pub struct Session {
    assistant: Arc<AskGita>,
    turns: Vec<Turn>,
}

impl Session {
    pub fn new(assistant: Arc<AskGita>) -> Self { Self { assistant, turns: Vec::new() } }

    /// Run one exchange. A failure is recorded as a system turn and returned;
    /// the session stays usable for the next question.
    pub async fn ask(&mut self, question: &str) -> Result<Reply> {
        self.push(Speaker::You, question.trim());
        match self.assistant.ask(question).await {
            Ok(reply) => {
                self.push(Speaker::GitaAi, &reply.render());
                Ok(reply)
            }
            Err(e) => {
                self.push(Speaker::System, &format!("Sorry, I couldn't answer that: {}", e));
                Err(e)
            }
        }
    }

    pub fn turns(&self) -> &[Turn] { &self.turns }

    fn push(&mut self, speaker: Speaker, message: &str) {
        self.turns.push(Turn { speaker, message: message.to_string() });
    }
}
