use crate::compiler::DEFAULT_COMPILER_ENDPOINT;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Sampling budgets per role.
pub const GENERATION_TEMPERATURE: f32 = 0.2;
pub const GENERATION_MAX_TOKENS: u32 = 1000;
pub const JUDGMENT_TEMPERATURE: f32 = 0.2;
pub const JUDGMENT_MAX_TOKENS: u32 = 800;

pub const CODER_PERSONALITY: &str = "You are a proficient coder in the Domain Specific Language called Envision. \
Your task is to generate a response to the given challenge. \
Some challenges will ask you to generate Envision code, \
others will ask you to explain given code or answer questions related to the Envision language. \
Do not output any intermediate thinking or explanation, only give the final answer. \
Here is the documentation of Envision:\n### Documentation\n";

/// Rubric that sticks to the professor's answer as the authority.
pub const JUDGE_RUBRIC: &str = "Your goal is to judge the correctness of STUDENT ANSWER, as an answer to the QUESTION. \
In order to judge the STUDENT ANSWER, you are given the PROFESSOR ANSWER with a piece of related documentation. \
Your main job is not to check the syntax correctness, but the logical correctness. \
If the STUDENT ANSWER does not treat the QUESTION logically, it is UNACCEPTABLE. \
Pay special attention to the comments in the PROFESSOR ANSWER. If these comments include \
a rule and if the STUDENT ANSWER violates it, this is UNACCEPTABLE. \
If in the show command, the STUDENT ANSWER add or omit a print position (like a1b2) compared to the PROFESSOR ANSWER, ignore this: this is always ACCEPTABLE. \
The use of extra variable or table to temporarily contain a intermediate quantity is ACCEPTABLE. \
Differences in variable names, column names, table names and label names etc. shall systematically be ACCEPTABLE! \
There are sometimes various ways or logics to treat the same QUESTION, and this is ACCEPTABLE, as long as the goal of the QUESTION is achieved. \
Let's think aloud step by step before making your judgement. Tell each ACCEPTABLE or UNACCEPTABLE point. \
At the end of your output, you should judge 0 if there is anything UNACCEPTABLE (even only 1 mark of UNACCEPTABLE) in the STUDENT ANSWER; \
and judge 1 if everything is ACCEPTABLE. End your judgment by the digit either 0 or 1. \
Here is the piece of related documentation : \n ## DOCUMENTATION\n";

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_endpoint() -> String {
    DEFAULT_COMPILER_ENDPOINT.to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_compile_attempts() -> u32 {
    3
}

/// Tunable settings; everything has a sensible default so a settings file is
/// optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_model")]
    pub coder_model: String,
    #[serde(default = "default_model")]
    pub judge_model: String,
    #[serde(default = "default_endpoint")]
    pub compiler_endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_compile_attempts")]
    pub max_compile_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            coder_model: default_model(),
            judge_model: default_model(),
            compiler_endpoint: default_endpoint(),
            request_timeout_secs: default_timeout_secs(),
            max_compile_attempts: default_compile_attempts(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read settings {}: {}", path.display(), e)))?;
    let settings: Settings = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    if settings.max_compile_attempts == 0 {
        return Err(ConfigError("max_compile_attempts must be at least 1".into()));
    }
    Ok(settings)
}

/// Per-run pipeline configuration: the personality/rubric strings are
/// assembled here once (coder personality carries the full documentation
/// brief) and passed by reference into every pipeline invocation, so tests
/// can swap personalities without touching global state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub settings: Settings,
    pub coder_system: String,
    judge_rubric: String,
}

impl PipelineConfig {
    pub fn new(docs_brief: &str, settings: Settings) -> Self {
        let coder_system = format!("{CODER_PERSONALITY}{docs_brief}");
        Self {
            settings,
            coder_system,
            judge_rubric: JUDGE_RUBRIC.to_string(),
        }
    }

    pub fn with_coder_system(mut self, coder_system: impl Into<String>) -> Self {
        self.coder_system = coder_system.into();
        self
    }

    pub fn with_judge_rubric(mut self, judge_rubric: impl Into<String>) -> Self {
        self.judge_rubric = judge_rubric.into();
        self
    }

    /// Judge system message: fixed rubric plus the documentation context
    /// resolved for this challenge.
    pub fn judge_system(&self, reference_context: &str) -> String {
        format!("{}{}", self.judge_rubric, reference_context)
    }
}
