//! The grounding prompt.
//!
//! Context comes before the question, and the instructions confine the model
//! to that context. Prior turns are never included.

pub struct PromptBuilder { scripture: String }

impl Default for PromptBuilder {
    fn default() -> Self { Self::new("Bhagavad Gita") }
}

impl PromptBuilder {
    pub fn new(scripture: &str) -> Self { Self { scripture: scripture.to_string() } }

    /// Newline-join `chunks` in order and wrap them with the question.
    pub fn build(&self, question: &str, chunks: &[String]) -> String {
        let context = chunks.join("\n");
        format!(
            "You are an AI spiritual assistant trained on the {s}.\n\
             Based on the following {s} verses, answer the question with meaning\n\
             from the given {s} context only. Do not hallucinate: never add verses,\n\
             teachings or facts that are not in the context, and if the context does\n\
             not contain the answer, say so.\n\
             Context:\n\
             {context}\n\
             \n\
             Question: {question}\n\
             Answer:",
            s = self.scripture,
            context = context,
            question = question,
        )
    }
}
