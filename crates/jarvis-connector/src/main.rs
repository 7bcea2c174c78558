//! jarvis-connector
//!
//! Connects the Gerrit checks plugin to the Jarvis CI pipeline.
//!
//! ```text
//!              every poll interval
//!  ┌──────────┐  pending checks  ┌───────────────┐  bounded queue  ┌───────────────┐
//!  │  Gerrit  │ ───────────────► │   Poll loop   │ ──────────────► │ Check executor│
//!  │ (checks) │ ◄─────────────── │ + submissions │                 └───────┬───────┘
//!  └──────────┘   check states,  └───────┬───────┘                         │
//!       ▲         hashtags               │ X-Jarvis: merge                 │ X-Jarvis: create
//!       │                                ▼                                 ▼
//!       │                        ┌─────────────────────────────────────────────┐
//!       └─────── check states ── │           CI event listener webhook         │
//!                                └─────────────────────────────────────────────┘
//! ```

mod checker;
mod cli;
mod error;
mod executor;
mod logger;
mod pipeline;
mod poll_loop;
mod status;
mod submission;
mod supervisor;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use checker::{CheckerRegistry, CheckerScheme};
use clap::Parser;
use cli::{Cli, Command};
use executor::CheckExecutor;
use gerrit_client::{BasicAuth, GerritClient, HttpGerritClient};
use jarvis_config::AppConfig;
use pipeline::{Pipeline, WebhookPipeline};
use poll_loop::PollLoop;
use std::sync::Arc;
use submission::SubmissionHandler;
use supervisor::RestartPolicy;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logger::init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    cli.apply(&mut config);

    let gerrit = gerrit_client(&config)?;
    let scheme = CheckerScheme::new(config.scheme.clone(), config.checker_kinds.clone())
        .context("Invalid checker_kinds in config")?;

    match cli.command() {
        Command::Serve => serve(&config, gerrit, scheme).await,
        Command::List => {
            let registry = CheckerRegistry::new(gerrit, scheme);
            for checker in registry.list_checkers().await? {
                println!("{}\t{}\t{}", checker.uuid, checker.repository, checker.status);
            }
            Ok(())
        }
        Command::Register {
            repo,
            prefix,
            update,
            blocking,
        } => {
            let registry = CheckerRegistry::new(gerrit, scheme);
            let checker = registry.register(&repo, &prefix, update, blocking).await?;
            println!("{}", checker.uuid);
            Ok(())
        }
        Command::Pending { uuid } => {
            let registry = CheckerRegistry::new(gerrit, scheme);
            for pending in registry.pending_checks(&uuid).await? {
                println!("{}", pending.patch_set);
            }
            Ok(())
        }
    }
}

fn gerrit_client(config: &AppConfig) -> Result<Arc<dyn GerritClient>> {
    let mut client = HttpGerritClient::new(&config.gerrit_url, config.request_timeout())
        .context("Failed to create Gerrit client")?
        .with_user_agent(config.user_agent.clone())
        .with_debug(config.debug);

    match jarvis_config::resolve_credentials(config)? {
        Some(who) => client = client.with_auth(BasicAuth::new(&who)),
        None => log::warn!("No Gerrit credentials configured; using anonymous access"),
    }

    log::info!("Using Gerrit at {}", client.base_url());
    Ok(Arc::new(client))
}

async fn serve(
    config: &AppConfig,
    gerrit: Arc<dyn GerritClient>,
    scheme: CheckerScheme,
) -> Result<()> {
    log::info!("Starting jarvis-connector");

    let pipeline: Arc<dyn Pipeline> = Arc::new(
        WebhookPipeline::new(&config.event_listener_url, config.request_timeout())
            .context("Failed to create pipeline client")?,
    );

    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

    let executor = CheckExecutor::new(
        gerrit.clone(),
        pipeline.clone(),
        scheme.clone(),
        config.repo_root(),
    );
    let executor_task = tokio::spawn(executor.run(rx));

    let submissions = SubmissionHandler::new(
        gerrit.clone(),
        pipeline,
        config.merge_hashtag.clone(),
        config.repo_root(),
    );
    let poll = PollLoop::new(
        gerrit,
        submissions,
        scheme.scheme(),
        config.poll_interval(),
        tx,
    );
    let policy = RestartPolicy::from_config(config);

    let result = tokio::select! {
        result = poll.run(&policy) => result.context("Poll loop stopped"),
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, shutting down");
            Ok(())
        }
    };

    // Closing the queue lets the executor drain what is already queued, then stop
    drop(poll);
    if let Err(e) = executor_task.await {
        log::error!("Check executor panicked: {}", e);
    }

    log::info!("Exiting jarvis-connector");
    result
}
