use crate::config::{PipelineConfig, JUDGMENT_MAX_TOKENS, JUDGMENT_TEMPERATURE};
use crate::model::Challenge;
use crate::providers::llm::{ChatRequest, LlmClient};

pub fn build_judge_prompt(challenge: &Challenge, candidate_answer: &str) -> String {
    format!(
        "### QUESTION: {}\n### PROFESSOR ANSWER: {}\n### STUDENT ANSWER: {}",
        challenge.question, challenge.reference_answer, candidate_answer
    )
}

/// Asks the judge model to compare the candidate against the professor
/// answer under the fixed rubric. Returns the free-form judgment text; the
/// terminal digit is extracted separately by `verdict`.
pub async fn evaluate(
    client: &dyn LlmClient,
    config: &PipelineConfig,
    challenge: &Challenge,
    reference_context: &str,
    candidate_answer: &str,
) -> anyhow::Result<String> {
    let system = config.judge_system(reference_context);
    let prompt = build_judge_prompt(challenge, candidate_answer);
    let response = client
        .complete(ChatRequest {
            system: &system,
            user: &prompt,
            temperature: JUDGMENT_TEMPERATURE,
            max_tokens: JUDGMENT_MAX_TOKENS,
        })
        .await?;
    Ok(response.text)
}
