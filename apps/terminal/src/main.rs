use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::prepare_database_url, load_settings, BootstrapOutcome, ClientSettings,
    HttpSessionService, RemoteSessionService, RestoreOutcome, SaveOutcome, SessionController,
};
use shared::domain::RespondentProfile;
use storage::{MemoryResultsHolder, ProgressStore, SqliteSlotBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;
mod session;

#[derive(Parser, Debug)]
#[command(name = "questionnaire", about = "Driver aptitude questionnaire")]
struct Cli {
    /// Overrides the configured scoring service url.
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    /// Overrides the configured sqlite url for saved progress.
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a respondent and start a fresh attempt.
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        age_group: String,
    },
    /// Answer questions interactively.
    Run,
    /// Show what is cached locally.
    Status,
    /// Save progress to the service for later.
    Save,
    /// Replace local answers with the copy saved on the service.
    Resume,
    /// Check the service and the local store.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(api_base_url) = cli.api_base_url {
        settings.api_base_url = api_base_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    settings.database_url = prepare_database_url(&settings.database_url);

    match cli.command {
        Command::Register {
            full_name,
            email,
            gender,
            age_group,
        } => {
            let controller = build_controller(&settings).await?;
            let profile = RespondentProfile {
                full_name,
                email,
                gender,
                age_group,
            };
            let session_id = controller.register(&profile).await?;
            controller.bootstrap().await?;
            let view = controller.view().await;
            println!("registered session {session_id} ({} questions)", view.total);
            println!("run `questionnaire run` to start answering");
        }
        Command::Run => {
            let controller = build_controller(&settings).await?;
            if controller.bootstrap().await? == BootstrapOutcome::RegistrationRequired {
                bail!("no registered session; run `questionnaire register` first");
            }
            session::run(&controller, settings.auto_advance_delay()).await?;
        }
        Command::Status => {
            let store = ProgressStore::open(&settings.database_url).await?;
            let snapshot = store.snapshot().await?;
            println!("{}", render::status(&snapshot));
        }
        Command::Save => {
            let controller = ready_controller(&settings).await?;
            match controller.save_progress().await? {
                SaveOutcome::Saved => println!("progress saved"),
                SaveOutcome::Ignored | SaveOutcome::Discarded => {
                    println!("progress was not saved, try again")
                }
            }
        }
        Command::Resume => {
            let controller = ready_controller(&settings).await?;
            match controller.restore_remote_progress().await? {
                RestoreOutcome::Restored { answered, index } => {
                    println!("restored {answered} answers, resuming at question {}", index + 1)
                }
                RestoreOutcome::Ignored | RestoreOutcome::Discarded => {
                    println!("progress was not restored, try again")
                }
            }
        }
        Command::Health => {
            let service = HttpSessionService::from_settings(&settings)?;
            let health = service
                .health_check()
                .await
                .with_context(|| format!("service at {} is unreachable", service.base_url()))?;
            println!("service: {} ({})", health.status, health.timestamp);

            let backend = SqliteSlotBackend::connect(&settings.database_url).await?;
            backend.health_check().await?;
            println!("store: ok ({})", settings.database_url);
        }
    }

    Ok(())
}

async fn build_controller(settings: &ClientSettings) -> Result<Arc<SessionController>> {
    let service = HttpSessionService::from_settings(settings)?;
    let store = ProgressStore::open(&settings.database_url).await?;
    info!(
        api_base_url = %service.base_url(),
        database_url = %settings.database_url,
        "questionnaire client configured"
    );
    Ok(SessionController::new_with_auto_advance_delay(
        Arc::new(service),
        store,
        Arc::new(MemoryResultsHolder::default()),
        settings.auto_advance_delay(),
    ))
}

async fn ready_controller(settings: &ClientSettings) -> Result<Arc<SessionController>> {
    let controller = build_controller(settings).await?;
    if controller.bootstrap().await? == BootstrapOutcome::RegistrationRequired {
        bail!("no registered session; run `questionnaire register` first");
    }
    Ok(controller)
}
