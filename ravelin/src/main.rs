use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ravelin::{DemoProvider, EchoTool, RavelinConfig, RavelinError};
use ravelin_agent::{BackgroundAgentConfig, BackgroundAgentManager, TaskConfig};
use ravelin_core::{AgentId, SessionId};
use ravelin_events::EventRouter;
use ravelin_memory::{InMemoryBackend, MemoryBackend};
use ravelin_react::{EpisodeRequest, ReactEngine};
use ravelin_remote::RemoteFacade;
use ravelin_resolver::ToolResolver;
use ravelin_tool::ToolRegistry;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("ravelin error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), RavelinError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if matches!(args.first().map(String::as_str), Some("--help") | Some("-h")) {
        print_usage();
        return Ok(());
    }

    let mut config_path: Option<PathBuf> = None;
    let mut prompt: Option<String> = None;
    let mut session_id: Option<String> = None;
    let mut demo_background = false;

    let mut remaining = std::mem::take(&mut args);
    while let Some(flag) = remaining.first().cloned() {
        remaining.remove(0);
        match flag.as_str() {
            "--config" => config_path = Some(PathBuf::from(take_arg("--config", &mut remaining)?)),
            "--prompt" => prompt = Some(take_arg("--prompt", &mut remaining)?),
            "--session" => session_id = Some(take_arg("--session", &mut remaining)?),
            "--background" => demo_background = true,
            other => return Err(RavelinError::Config(format!("unknown flag: {other}"))),
        }
    }

    let config = match config_path {
        Some(path) => RavelinConfig::from_path(&path)?,
        None => {
            let default_path = PathBuf::from("ravelin.json");
            if default_path.exists() {
                RavelinConfig::from_path(&default_path)?
            } else {
                RavelinConfig::default()
            }
        }
    };

    let user_query = match prompt {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            let trimmed = buffer.trim().to_string();
            if trimmed.is_empty() {
                return Err(RavelinError::Config(
                    "missing prompt: pass --prompt or pipe stdin".to_string(),
                ));
            }
            trimmed
        }
    };

    let session_id = SessionId::new(session_id.unwrap_or_else(|| "demo".to_string()));

    let mut local_tools = ToolRegistry::new();
    local_tools.register(Arc::new(EchoTool));

    let resolver = ToolResolver::new(local_tools, RemoteFacade::new());
    let memory: Arc<dyn MemoryBackend> = Arc::new(InMemoryBackend::new());
    let events = Arc::new(EventRouter::new());

    let engine = Arc::new(ReactEngine::new(DemoProvider, resolver, memory, events.clone()));

    let request = EpisodeRequest {
        session_id,
        agent_name: config.agent_name.clone(),
        user_query: user_query.clone(),
        system_instruction: config.system_instruction.clone(),
        model_config: config.model_config.clone(),
        limits: config.limits.clone(),
    };

    let outcome = engine.run(request, &CancellationToken::new()).await?;
    println!("{}", outcome.content);

    if demo_background {
        run_background_demo(engine, events, config, user_query).await?;
    }

    Ok(())
}

/// Exercises the background-agent manager alongside the foreground
/// episode above: creates one agent sharing the same engine, lets it
/// tick a couple of times, prints its status, and shuts the manager
/// down. Purely illustrative — a real deployment would keep the manager
/// running for the process lifetime instead of tearing it down.
async fn run_background_demo(
    engine: Arc<ReactEngine<DemoProvider>>,
    events: Arc<EventRouter>,
    config: RavelinConfig,
    user_query: String,
) -> Result<(), RavelinError> {
    let manager = BackgroundAgentManager::new(engine, events);
    let agent_id = AgentId::new("ravelin-demo-background");

    manager
        .create_agent(
            agent_id.clone(),
            BackgroundAgentConfig {
                system_instruction: config.system_instruction,
                model_config: config.model_config,
                task_config: TaskConfig { query: user_query, metadata: serde_json::Value::Null },
                limits: config.limits,
                interval_seconds: 1,
                max_retries: 1,
                retry_delay_seconds: 1,
            },
        )
        .await?;

    manager.start().await;
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let status = manager.status(&agent_id).await?;
    println!(
        "background agent `{}`: state={:?} run_count={} error_count={}",
        agent_id, status.state, status.run_count, status.error_count
    );

    manager.shutdown().await;
    Ok(())
}

fn take_arg(flag: &str, remaining: &mut Vec<String>) -> Result<String, RavelinError> {
    if remaining.is_empty() {
        return Err(RavelinError::Config(format!("missing value for {flag}")));
    }
    Ok(remaining.remove(0))
}

fn print_usage() {
    println!(
        "ravelin [--config ravelin.json] [--prompt TEXT] [--session ID] [--background]\n\
         Reads the prompt from --prompt or stdin, runs one reasoning episode \
         against the built-in demo provider, and prints the final answer.\n\
         --background additionally runs the same task as a scheduled \
         background agent for a few seconds and prints its status."
    );
}
