use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use switchboard_config::{RouterConfig, ScenarioFile, WorkflowDef};
use switchboard_dispatch::{TaskDispatcher, TaskResult};
use switchboard_orchestrator::{ChannelNotifier, ExecutionEvent, Sequencer};
use switchboard_registry::StaticRegistry;
use switchboard_workflow::Workflow;

/// Switchboard - route natural-language tasks between cooperating agents
#[derive(Parser)]
#[command(name = "switchboard")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the router config (default: ~/.switchboard/router.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve and print a peer's descriptor
  Describe {
    /// Logical peer name
    peer: String,
  },

  /// Send one task to a peer and print the normalized result
  Send {
    /// Logical peer name
    peer: String,

    /// Task text
    text: String,
  },

  /// Lock and run a workflow
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Original request; read from stdin when absent
    #[arg(long)]
    request: Option<String>,
  },

  /// Send each scenario of a file to its target peer
  Scenarios {
    /// Path to the scenario file (JSON)
    scenario_file: PathBuf,

    /// Pause between scenarios, overriding the file
    #[arg(long)]
    pause_ms: Option<u64>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let Some(command) = cli.command else {
    println!("switchboard - use --help to see available commands");
    return Ok(());
  };

  let config = load_config(cli.config)?;
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    match command {
      Commands::Describe { peer } => describe(&config, &peer).await,
      Commands::Send { peer, text } => send(&config, &peer, &text).await,
      Commands::Run {
        workflow_file,
        request,
      } => run_workflow(&config, &workflow_file, request).await,
      Commands::Scenarios {
        scenario_file,
        pause_ms,
      } => run_scenarios(&config, &scenario_file, pause_ms).await,
    }
  })
}

/// Explicit paths must exist; the default path falls back to the local demo peers.
fn load_config(path: Option<PathBuf>) -> Result<RouterConfig> {
  if let Some(path) = path {
    return RouterConfig::load(&path)
      .with_context(|| format!("failed to load router config: {}", path.display()));
  }

  let default_path = dirs::home_dir().map(|home| home.join(".switchboard").join("router.json"));
  match default_path {
    Some(path) if path.exists() => RouterConfig::load(&path)
      .with_context(|| format!("failed to load router config: {}", path.display())),
    _ => {
      info!(fallback = "local_demo", "router_config_not_found");
      Ok(RouterConfig::local_demo())
    }
  }
}

fn dispatcher(config: &RouterConfig) -> Result<TaskDispatcher> {
  let registry = StaticRegistry::from_config(config).context("invalid peer registry")?;
  Ok(TaskDispatcher::from_config(config, Arc::new(registry)))
}

async fn describe(config: &RouterConfig, peer: &str) -> Result<()> {
  let dispatcher = dispatcher(config)?;
  let descriptor = dispatcher
    .describe(peer)
    .await
    .with_context(|| format!("failed to resolve peer '{}'", peer))?;

  println!("Name:        {}", descriptor.name);
  println!("URL:         {}", descriptor.url);
  println!("Version:     {}", descriptor.version);
  println!("Description: {}", descriptor.description);
  println!("Streaming:   {}", descriptor.capabilities.streaming);
  let transports: Vec<String> = descriptor
    .supported_transports()
    .iter()
    .map(ToString::to_string)
    .collect();
  println!("Transports:  {}", transports.join(", "));
  for skill in &descriptor.skills {
    println!("Skill:       {} - {}", skill.name, skill.description);
  }

  Ok(())
}

async fn send(config: &RouterConfig, peer: &str, text: &str) -> Result<()> {
  let dispatcher = dispatcher(config)?;
  let result = dispatcher.dispatch(peer, text).await;
  print_result(&result)?;
  if !result.is_success() {
    bail!("{}", result.describe());
  }
  Ok(())
}

async fn run_workflow(config: &RouterConfig, workflow_file: &Path, request: Option<String>) -> Result<()> {
  let def = WorkflowDef::load(workflow_file)
    .with_context(|| format!("failed to load workflow file: {}", workflow_file.display()))?;
  info!(workflow = %def.name, "workflow_loaded");

  let request = match request {
    Some(request) => request,
    None => read_request_from_stdin()?,
  };

  let dispatcher = dispatcher(config)?;
  let workflow = Workflow::lock(&def, dispatcher.registry(), config.presenter.as_deref())
    .context("workflow rejected")?;
  info!(workflow_id = %workflow.workflow_id, steps = workflow.steps.len(), "workflow_locked");

  let (tx, mut rx) = mpsc::unbounded_channel();
  let progress = tokio::spawn(async move {
    while let Some(event) = rx.recv().await {
      print_event(&event);
    }
  });

  let sequencer = Sequencer::with_notifier(dispatcher, ChannelNotifier::new(tx));
  let result = sequencer.run(&workflow, &request).await;
  drop(sequencer);
  progress.await.context("progress printer failed")?;

  let completion = result.context("workflow execution failed")?;
  info!(execution_id = %completion.execution_id, "execution_completed");
  println!("{}", completion.text);

  Ok(())
}

async fn run_scenarios(config: &RouterConfig, scenario_file: &Path, pause_ms: Option<u64>) -> Result<()> {
  let file = ScenarioFile::load(scenario_file)
    .with_context(|| format!("failed to load scenario file: {}", scenario_file.display()))?;
  let pause = Duration::from_millis(pause_ms.unwrap_or(file.pause_ms));
  let dispatcher = dispatcher(config)?;

  let mut failures = 0;
  for (index, scenario) in file.scenarios.iter().enumerate() {
    if index > 0 && !pause.is_zero() {
      info!(pause_ms = pause.as_millis() as u64, "scenario_pause");
      tokio::time::sleep(pause).await;
    }

    let target = file.target_for(scenario);
    println!("=== {} ===", scenario.title);
    println!("Query ({}): {}", target, scenario.query);

    let result = dispatcher.dispatch(target, &scenario.query).await;
    print_result(&result)?;
    if !result.is_success() {
      failures += 1;
    }
    println!();
  }

  if failures > 0 {
    bail!("{} of {} scenarios failed", failures, file.scenarios.len());
  }
  Ok(())
}

fn print_result(result: &TaskResult) -> Result<()> {
  match result {
    TaskResult::Success { text } => println!("{}", text),
    other => println!("{}", serde_json::to_string_pretty(other)?),
  }
  Ok(())
}

fn print_event(event: &ExecutionEvent) {
  match event {
    ExecutionEvent::StepStarted { index, peer, .. } => eprintln!("step {} -> {}", index, peer),
    ExecutionEvent::ItemCompleted {
      index,
      item,
      success,
      ..
    } => eprintln!(
      "step {} item {}: {}",
      index,
      item,
      if *success { "ok" } else { "failed" }
    ),
    ExecutionEvent::StepFailed { index, error, .. } => eprintln!("step {} failed: {}", index, error),
    _ => {}
  }
}

fn read_request_from_stdin() -> Result<String> {
  if io::stdin().is_terminal() {
    bail!("no request given; pass --request or pipe it on stdin");
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read request from stdin")?;

  let request = input.trim();
  if request.is_empty() {
    bail!("request on stdin is empty");
  }
  Ok(request.to_string())
}
