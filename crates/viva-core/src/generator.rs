use crate::config::{PipelineConfig, GENERATION_MAX_TOKENS, GENERATION_TEMPERATURE};
use crate::providers::llm::{ChatRequest, LlmClient};

/// First line marking a challenge whose answer is prose, not code. Such
/// questions must never go through the compile gate.
pub const TEXTUAL_ONLY_SENTINEL: &str =
    "# this question expects a textual answer and not generation of code. #";

pub fn is_textual_only(question: &str) -> bool {
    question.split('\n').next() == Some(TEXTUAL_ONLY_SENTINEL)
}

/// Asks the coder model for a candidate answer. Returns the model's text
/// verbatim; fence stripping happens at the compile gate.
pub async fn generate(
    client: &dyn LlmClient,
    config: &PipelineConfig,
    question: &str,
) -> anyhow::Result<String> {
    let response = client
        .complete(ChatRequest {
            system: &config.coder_system,
            user: question,
            temperature: GENERATION_TEMPERATURE,
            max_tokens: GENERATION_MAX_TOKENS,
        })
        .await?;
    Ok(response.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::providers::llm::FakeClient;

    #[test]
    fn sentinel_must_be_the_exact_first_line() {
        let question = format!("{TEXTUAL_ONLY_SENTINEL}\nWhat is a table?");
        assert!(is_textual_only(&question));
        assert!(is_textual_only(TEXTUAL_ONLY_SENTINEL));
        assert!(!is_textual_only("What is a table?"));
        // indented sentinel does not count
        assert!(!is_textual_only(&format!(" {TEXTUAL_ONLY_SENTINEL}")));
        // sentinel anywhere but the first line does not count
        assert!(!is_textual_only(&format!(
            "What is a table?\n{TEXTUAL_ONLY_SENTINEL}"
        )));
    }

    #[tokio::test]
    async fn returns_model_text_verbatim() {
        let client =
            FakeClient::new("fake".into()).with_response("```envision\nshow x\n```".into());
        let config = PipelineConfig::new("brief", Settings::default());
        let answer = generate(&client, &config, "write a show").await.unwrap();
        assert_eq!(answer, "```envision\nshow x\n```");
    }
}
