//! Command handlers

use crate::demo;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use screenflow_core::events::{EngineEvent, EventBus, LISTENER_PANICKED, STANDARD_EVENTS};
use screenflow_core::services::{attach_tracing, init_logging};
use screenflow_core::workflow::{ProcessRunner, RunnerConfig, WorkflowRegistry};
use screenflow_core::{EngineConfig, LogLevel, RunStatus};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

type EventLog = Arc<Mutex<Vec<(DateTime<Utc>, EngineEvent)>>>;

/// Resolve an explicit config path or fall back to the XDG default
fn resolve_config_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => EngineConfig::default_config_path()
            .context("Failed to determine default config path"),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<(PathBuf, EngineConfig)> {
    let path = resolve_config_path(path)?;
    let config = EngineConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok((path, config))
}

/// Initialize logging from the flag, else from the configured level
pub fn init_cli_logging(flag: Option<&str>) -> Result<()> {
    let level = match flag {
        Some(level) => level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!(e))?,
        None => EngineConfig::default_config_path()
            .ok()
            .and_then(|path| EngineConfig::load_from_file(&path).ok())
            .map(|config| config.log_level)
            .unwrap_or_default(),
    };

    init_logging(level).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Handle demo command
pub async fn handle_demo(
    fail_password: bool,
    json: bool,
    timeout: Option<u64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (path, mut config) = load_config(config_path)?;
    if let Some(seconds) = timeout {
        config.detection_timeout_seconds = seconds;
    }
    config.validate().map_err(|errors| {
        anyhow::anyhow!(
            "Invalid configuration ({}): {}",
            path.display(),
            errors.join("; ")
        )
    })?;
    let runner_config = RunnerConfig::from(&config);

    let registry = WorkflowRegistry::new();
    demo::register(&registry);
    let workflow = registry
        .create(demo::LOGIN_WORKFLOW)
        .context("Failed to build demo workflow")?;

    let bus = Arc::new(EventBus::new());
    attach_tracing(&bus);
    let log = record_events(&bus, !json);

    let mut runner = ProcessRunner::new(
        Arc::new(workflow),
        demo::simulated_page(),
        bus,
        runner_config,
    )
    .with_extension(Arc::new(demo::BannerExtension));
    let mut context = demo::context(fail_password);

    tracing::info!(run_id = %runner.run_id(), "Running demo workflow");
    let result = runner.run(&mut context).await;

    if json {
        let events = log
            .lock()
            .map_err(|_| anyhow::anyhow!("event log poisoned"))?
            .iter()
            .map(|(at, event)| -> Result<serde_json::Value, serde_json::Error> {
                Ok(serde_json::json!({
                    "timestamp": at.to_rfc3339(),
                    "event": serde_json::to_value(event)?,
                }))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let output = serde_json::json!({
            "run_id": runner.run_id().to_string(),
            "workflow": demo::LOGIN_WORKFLOW,
            "final_state": runner.current_state().name(),
            "status": status_label(runner.status()),
            "outcome": result.as_ref().ok().map(|outcome| outcome.as_str()),
            "error": result.as_ref().err().map(|err| err.to_string()),
            "events": events,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        println!("Run ID:       {}", runner.run_id());
        println!("Final state:  {}", runner.current_state().name());
        match &result {
            Ok(outcome) => println!("Outcome:      {}", outcome),
            Err(err) => println!("Error:        {}", err),
        }
    }

    result.context("Demo run failed")?;
    Ok(())
}

/// Record every published event; optionally echo each one as it happens
fn record_events(bus: &EventBus, echo: bool) -> EventLog {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    for name in STANDARD_EVENTS.iter().chain(std::iter::once(&LISTENER_PANICKED)) {
        let sink = log.clone();
        bus.subscribe(name, move |event| {
            let at = Utc::now();
            if echo {
                println!("[{}] {:<18} {}", at.format("%H:%M:%S%.3f"), event.name(), describe(event));
            }
            if let Ok(mut events) = sink.lock() {
                events.push((at, event.clone()));
            }
        });
    }
    log
}

/// One-line human summary of an event
fn describe(event: &EngineEvent) -> String {
    match event {
        EngineEvent::StateChanged { from, to } => format!("{} -> {}", from, to),
        EngineEvent::ScreenDetected { screen } => screen.to_string(),
        EngineEvent::DetectionTimeout { expected } => {
            let expected: Vec<&str> = expected.iter().map(|tag| tag.as_str()).collect();
            format!("expected [{}]", expected.join(", "))
        }
        EngineEvent::ActionExecuting { command } | EngineEvent::ActionExecuted { command } => {
            command.to_string()
        }
        EngineEvent::ActionFailed { command, error } => format!("{}: {}", command, error),
        EngineEvent::ProcessStarted { process } => process.clone(),
        EngineEvent::ProcessCompleted { process, outcome } => format!("{} ({})", process, outcome),
        EngineEvent::ProcessFailed { process, error } => format!("{}: {}", process, error),
        EngineEvent::ListenerPanicked {
            source_event,
            message,
        } => format!("{}: {}", source_event, message),
        EngineEvent::Custom { payload, .. } => payload.to_string(),
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Running => "running",
        RunStatus::Success => "success",
        RunStatus::Failure => "failure",
        RunStatus::Retry => "retry",
    }
}

/// Handle config show command
pub fn handle_config_show(path: Option<PathBuf>, json: bool) -> Result<()> {
    let (path, config) = load_config(path)?;

    if json {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Configuration");
        println!("=============");
        println!("File:                 {}", path.display());
        if !path.exists() {
            println!("                      (not found, showing defaults)");
        }
        println!("Detection timeout:    {}s", config.detection_timeout_seconds);
        println!("Poll interval:        {}ms", config.poll_interval_ms);
        println!("Log level:            {}", config.log_level.as_str());
    }

    Ok(())
}

/// Handle config init command
pub fn handle_config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = resolve_config_path(path)?;

    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "Configuration file {} already exists. Use --force to overwrite it.",
            path.display()
        ));
    }

    EngineConfig::default()
        .save_to_file(&path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    println!("✅ Wrote default configuration to {}", path.display());
    Ok(())
}

/// Handle config validate command
pub fn handle_config_validate(path: Option<PathBuf>) -> Result<()> {
    let (path, config) = load_config(path)?;

    match config.validate() {
        Ok(()) => {
            println!("✅ Configuration {} is valid", path.display());
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                println!("❌ {}", error);
            }
            Err(anyhow::anyhow!(
                "Configuration {} has {} error(s)",
                path.display(),
                errors.len()
            ))
        }
    }
}

/// Handle workflows command
pub fn handle_workflows(json: bool) -> Result<()> {
    let registry = WorkflowRegistry::new();
    demo::register(&registry);
    let names = registry.list();

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for name in names {
            let workflow = registry
                .create(&name)
                .with_context(|| format!("Failed to build workflow '{}'", name))?;
            println!(
                "{:<12} {} screens, {} interrupt(s)",
                name,
                workflow.screens().len(),
                workflow.global_interrupts().len()
            );
        }
    }

    Ok(())
}
