use serde::{Deserialize, Serialize};

/// A pointer into the documentation corpus: `document_id` names a markdown
/// file (without extension), `section_title` a `##` heading inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePointer {
    pub document_id: String,
    pub section_title: String,
}

/// A challenge document, parsed once and immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub question: String,
    pub reference_answer: String,
    pub references: Vec<ReferencePointer>,
}

/// Outcome of running one challenge through the full pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub candidate_answer: String,
    pub judge_rationale: String,
    pub accepted: bool,
}

/// Accept/attempt tally over a batch. Derived, recomputed each run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchScore {
    pub attempted: usize,
    pub accepted: usize,
}

impl BatchScore {
    pub fn record(&mut self, accepted: bool) {
        self.attempted += 1;
        if accepted {
            self.accepted += 1;
        }
    }

    pub fn percent(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.attempted as f64 * 100.0
    }
}

/// Raw completion returned by an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
}
