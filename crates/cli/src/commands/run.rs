//! `toolweave run` — One-shot prompt mode.

use std::sync::Arc;

use toolweave_agent::{Agent, ArgumentErrorPolicy, TerminationMode};
use toolweave_config::AppConfig;
use toolweave_core::session::{TranscriptStore, UsageSink};
use toolweave_core::transport::CompletionTransport;
use toolweave_providers::OpenAiCompatTransport;
use toolweave_session::{InMemoryTranscript, JsonlTranscript};
use toolweave_telemetry::UsageLedger;

pub async fn run(
    prompt: String,
    model: Option<String>,
    show_usage: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early — give a clear error
    if config.provider != "ollama" && !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TOOLWEAVE_API_KEY");
        eprintln!("    OPENROUTER_API_KEY");
        eprintln!("    OPENAI_API_KEY");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let transport = build_transport(&config)?;
    let registry = Arc::new(toolweave_tools::default_registry()?);

    let store: Arc<dyn TranscriptStore> = match config.transcript.backend.as_str() {
        "jsonl" => {
            let path = config
                .sessions_dir()
                .join(format!("{}.jsonl", uuid::Uuid::new_v4()));
            tracing::info!(path = %path.display(), "Writing transcript");
            Arc::new(JsonlTranscript::new(path))
        }
        _ => Arc::new(InMemoryTranscript::new()),
    };

    let ledger = Arc::new(UsageLedger::new());

    let mode: TerminationMode = config.termination_mode.parse()?;
    let policy: ArgumentErrorPolicy = config.argument_policy.parse()?;

    let mut agent = Agent::new(
        transport,
        model.unwrap_or_else(|| config.model.clone()),
        registry,
        store,
        Arc::clone(&ledger) as Arc<dyn UsageSink>,
    )
    .with_temperature(config.temperature)
    .with_max_iterations(config.max_iterations)
    .with_termination_mode(mode)
    .with_argument_policy(policy);

    if let Some(max) = config.max_tokens {
        agent = agent.with_max_tokens(max);
    }
    if let Some(prompt_override) = &config.system_prompt {
        agent = agent.with_system_prompt(prompt_override);
    }

    let payload = agent.run(prompt).await?;

    // A string "answer" field prints bare; anything else prints as JSON.
    match payload.get("answer").and_then(|a| a.as_str()) {
        Some(answer) => println!("{answer}"),
        None => println!("{}", serde_json::to_string_pretty(&payload)?),
    }

    if show_usage {
        let totals = ledger.totals().await;
        eprintln!();
        eprintln!(
            "  Usage: {} rounds, {} prompt + {} completion = {} tokens",
            totals.rounds, totals.prompt_tokens, totals.completion_tokens, totals.total_tokens
        );
    }

    Ok(())
}

fn build_transport(
    config: &AppConfig,
) -> Result<Arc<dyn CompletionTransport>, Box<dyn std::error::Error>> {
    let api_key = config.api_key.clone().unwrap_or_default();

    let transport = match (config.provider.as_str(), &config.base_url) {
        (provider, Some(url)) => OpenAiCompatTransport::new(provider, url, api_key)?,
        ("openai", None) => OpenAiCompatTransport::openai(api_key)?,
        ("openrouter", None) => OpenAiCompatTransport::openrouter(api_key)?,
        ("ollama", None) => OpenAiCompatTransport::ollama(None)?,
        (other, None) => {
            return Err(format!(
                "Unknown provider '{other}' and no base_url configured"
            )
            .into());
        }
    };

    Ok(Arc::new(transport))
}
