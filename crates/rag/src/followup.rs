//! Follow-up question generation.
//!
//! A non-critical enrichment of the answer path: backend failures degrade
//! to an empty set instead of propagating.

use crate::model_output;
use crate::types::FollowUpSet;
use knowhow_llm::{GenerationRequest, Generator};
use std::sync::Arc;

/// Generates related questions from a query/answer pair.
pub struct FollowUpGenerator {
    generator: Arc<dyn Generator>,
}

impl FollowUpGenerator {
    /// Create a follow-up generator.
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Produce up to three distinct follow-up questions.
    ///
    /// The model output is parsed permissively; if fewer than three
    /// distinct questions are recovered, the set is returned short rather
    /// than padded with fabricated entries. A generator fault returns an
    /// empty set.
    pub async fn follow_ups(&self, query_text: &str, answer_text: &str) -> FollowUpSet {
        let request = GenerationRequest::new(build_prompt(query_text, answer_text))
            .with_max_tokens(200)
            .with_temperature(0.7);

        match self.generator.generate(&request).await {
            Ok(response) => {
                let questions = model_output::parse_question_list(&response.content);
                let set = FollowUpSet::from_questions(questions);
                if set.count() < FollowUpSet::TARGET {
                    tracing::debug!(
                        recovered = set.count(),
                        "Follow-up parsing recovered fewer questions than requested"
                    );
                }
                set
            }
            Err(e) => {
                tracing::warn!("Follow-up generation failed, returning empty set: {}", e);
                FollowUpSet::empty()
            }
        }
    }
}

fn build_prompt(query: &str, answer: &str) -> String {
    format!(
        "A user asked: {}\n\
         They received this answer:\n{}\n\n\
         Suggest exactly 3 short follow-up questions the user might ask next. \
         Return them as a numbered list, one question per line, with no other text.",
        query, answer
    )
}
