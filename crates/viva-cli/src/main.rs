use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use viva_core::compiler::RemoteCompiler;
use viva_core::config::{load_settings, PipelineConfig, Settings};
use viva_core::docs::DocStore;
use viva_core::pipeline::Pipeline;
use viva_core::providers::llm::OpenAiClient;

/// Scores a coder model on a corpus of DSL challenge documents.
#[derive(Debug, Parser)]
#[command(name = "viva", version)]
struct Cli {
    /// Directory of challenge markdown files (question / # ANSWER / # References)
    challenge_dir: PathBuf,

    /// Challenge ids to run (file stems). Defaults to every *.md in the
    /// challenge directory except description.md.
    ids: Vec<String>,

    /// Directory of documentation markdown files
    #[arg(long, default_value = "docs")]
    docs: PathBuf,

    /// Documentation brief appended to the coder personality, relative to --docs
    #[arg(long, default_value = "envision-brief.md")]
    brief: String,

    /// Optional YAML settings file (models, compiler endpoint, retry bound)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// API key for the completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            2
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };

    let brief_path = cli.docs.join(&cli.brief);
    let brief = std::fs::read_to_string(&brief_path).map_err(|e| {
        anyhow::anyhow!("failed to read brief {}: {}", brief_path.display(), e)
    })?;

    let coder = Arc::new(OpenAiClient::new(
        settings.coder_model.clone(),
        cli.api_key.clone(),
        settings.request_timeout(),
    )?);
    let judge = Arc::new(OpenAiClient::new(
        settings.judge_model.clone(),
        cli.api_key.clone(),
        settings.request_timeout(),
    )?);
    let compiler = Arc::new(RemoteCompiler::new(
        settings.compiler_endpoint.clone(),
        settings.request_timeout(),
    )?);
    let docs = DocStore::new(&cli.docs);
    let config = PipelineConfig::new(&brief, settings);
    let pipeline = Pipeline::new(coder, judge, compiler, docs, config);

    let ids = if cli.ids.is_empty() {
        discover_ids(&cli.challenge_dir)?
    } else {
        cli.ids.clone()
    };
    if ids.is_empty() {
        anyhow::bail!(
            "no challenges found in {}",
            cli.challenge_dir.display()
        );
    }

    let mut challenges = Vec::with_capacity(ids.len());
    for id in &ids {
        let path = cli.challenge_dir.join(format!("{id}.md"));
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("failed to read challenge {}: {}", path.display(), e)
        })?;
        challenges.push((id.clone(), raw));
    }

    let score = pipeline.score_batch(&challenges).await;
    viva_core::report::print_summary(&score);
    Ok(0)
}

fn discover_ids(challenge_dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(challenge_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem == "description" {
            continue;
        }
        ids.push(stem.to_string());
    }
    ids.sort();
    Ok(ids)
}
