use std::{env, thread};

use colored::Colorize;
use log::{error, info};
use thiserror::Error;

use dosehub_core::{Config, NewMedication, TrackerEvent};
use dosehub_family::{AuthError, Family, HubError, MedicationError, NewAccount};
use dosehub_impls::{LogNotifier, MemoryIdentity, MemoryStore};

mod logging;

type App = Family<MemoryStore, MemoryIdentity, LogNotifier>;

#[derive(Debug, Error)]
enum AppError {
    #[error("Could not set up demo accounts: {0}")]
    Auth(#[from] AuthError),

    #[error("Could not set up the demo hub: {0}")]
    Hub(#[from] HubError),

    #[error("Could not seed demo medications: {0}")]
    Medication(#[from] MedicationError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl AppError {
    fn hint(&self) -> String {
        match self {
            AppError::Auth(_) | AppError::Hub(_) | AppError::Medication(_) => {
                "The demo household could not be seeded. The in-memory store should never reject these writes.".to_string()
            }
            AppError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = config_from_env();

    info!(
        "Starting dosehub, checking schedules every {} seconds",
        config.tick_rate_in_seconds
    );

    let family: App = Family::new(
        config,
        MemoryStore::new(),
        MemoryIdentity::new(),
        LogNotifier::new(),
    );

    family.tracker.request_permission().await;

    let maria = family
        .auth
        .sign_up(NewAccount {
            name: "Maria".to_string(),
            email: "maria@example.com".to_string(),
            password: "correct horse battery staple".to_string(),
        })
        .await?;

    let jonas = family
        .auth
        .sign_up(NewAccount {
            name: "Jonas".to_string(),
            email: "jonas@example.com".to_string(),
            password: "hunter2".to_string(),
        })
        .await?;

    let hub = family.hubs.create_hub("Evergreen House", &maria.id).await?;
    family.hubs.join_hub(&hub.join_code, &jonas.id).await?;

    let now = chrono::Local::now().time();

    // One dose long overdue, one about to come up, one later today
    for (name, dosage, offset_in_minutes) in [
        ("Levothyroxine", "50 mcg", -20),
        ("Aspirin", "100 mg", 1),
        ("Vitamin D", "", 120),
    ] {
        family
            .medications
            .add(NewMedication {
                hub_id: hub.id.clone(),
                name: name.to_string(),
                dosage: dosage.to_string(),
                reminder_time: now + chrono::Duration::minutes(offset_in_minutes),
                image_url: None,
            })
            .await?;
    }

    let events = family.tracker.events();

    thread::spawn(move || {
        while let Ok(event) = events.recv() {
            info!("{}", describe(&event));
        }
    });

    let _watch = family.tracker.watch(hub.id.clone());

    info!(
        "Watching hub \"{}\", others can join with code {}",
        hub.name, hub.join_code
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::Fatal(e.to_string()))?;

    Ok(())
}

fn describe(event: &TrackerEvent) -> String {
    match event {
        TrackerEvent::SnapshotUpdated { medications, .. } => {
            format!("Snapshot applied with {} medications", medications.len())
        }
        TrackerEvent::ReminderDue {
            medication_id,
            stage,
        } => {
            format!("Reminder for {medication_id} reached the {stage:?} stage")
        }
        TrackerEvent::DoseLapsed { medication_id, .. } => {
            format!("Dose of {medication_id} lapsed, hub members were alerted")
        }
    }
}

/// The tick rate can be turned down for watching the demo escalate quickly
fn config_from_env() -> Config {
    let default = Config::default();

    let tick_rate_in_seconds = env::var("DOSEHUB_TICK_SECONDS")
        .map(|x| x.parse().expect("Tick rate must be a number"))
        .unwrap_or(default.tick_rate_in_seconds);

    Config {
        tick_rate_in_seconds,
        ..default
    }
}

#[tokio::main]
async fn main() {
    logging::init_logger();

    match run().await {
        Ok(()) => info!("Shutting down."),
        Err(error) => {
            error!(
                "{} Read the error below to troubleshoot the issue.",
                "dosehub failed to start!".bold().red()
            );
            error!("{}", error);
            error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());
        }
    }
}
