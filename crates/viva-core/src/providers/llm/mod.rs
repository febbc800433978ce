use crate::model::LlmResponse;
use async_trait::async_trait;

mod fake;
mod openai;

pub use fake::FakeClient;
pub use openai::OpenAiClient;

/// One chat completion call: a system instruction, a user message and the
/// sampling budget for this role (coder and judge use different budgets).
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: ChatRequest<'_>) -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;
}
