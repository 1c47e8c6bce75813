//! veno: command-line companion for the Veno study platform.
//!
//! Inspect configuration, watch who is online over the realtime service,
//! and run quizzes in the terminal.

mod cli;
mod quiz;

use std::path::Path;
use std::sync::Arc;

use veno_config::schema::VenoConfig;
use veno_presence::{Identity, PresenceSync, RealtimeClient, RealtimeConfig};

use crate::cli::Command;

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let default_filter = match &args.log_level {
        Some(level) => format!("veno={level}"),
        None => "veno=info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = match &args.config {
        Some(path) => veno_config::toml_loader::load_from_path(Path::new(path)),
        None => veno_config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Command::Config => {
            println!("{}", veno_config::config_to_json(&config));
            Ok(())
        }
        Command::Presence { user_id, email } => run_presence(&config, user_id, email).await,
        Command::Quiz { file, duration } => {
            let duration_secs = duration.unwrap_or(config.cbt.default_duration_secs);
            quiz::run(&file, duration_secs, config.cbt.shuffle_questions)
                .map_err(|e| e.to_string())
        }
    };

    if let Err(message) = outcome {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}

async fn run_presence(
    config: &VenoConfig,
    user_id: String,
    email: Option<String>,
) -> Result<(), String> {
    if !config.presence.enabled {
        return Err("presence is disabled in the config".into());
    }
    if config.supabase.project_ref.is_empty() {
        return Err("supabase.project_ref is not configured".into());
    }

    let realtime = RealtimeClient::connect(RealtimeConfig {
        project_ref: config.supabase.project_ref.clone(),
        api_key: config.supabase.anon_key.clone(),
        access_token: None,
        heartbeat_interval_secs: config.presence.heartbeat_interval,
        reconnect_delay_secs: config.presence.reconnect_delay,
        max_reconnect_delay_secs: config.presence.max_reconnect_delay,
    });

    let (mut sync, mut snapshots) =
        PresenceSync::new(Arc::new(realtime), config.presence.topic.clone());
    sync.set_identity(Some(Identity::new(user_id, email))).await;

    println!("watching {} — Ctrl-C to quit", config.presence.topic);
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow().clone();
                let names: Vec<&str> = snapshot
                    .online_users
                    .iter()
                    .map(|record| record.username.as_str())
                    .collect();
                println!(
                    "connected: {} | online ({}): {}",
                    snapshot.is_connected,
                    names.len(),
                    if names.is_empty() { "-".to_string() } else { names.join(", ") },
                );
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    sync.shutdown().await;
    Ok(())
}
