// PrayerTrack - prayer request tracker
// Entry point: parses the command line, sets up logging and runs one command

use anyhow::{Context, Result};
use clap::Parser;
use prayertrack::commands;
use prayertrack::config::{Args, Command, SheetsConfig};
use prayertrack::database::{Identity, NewPrayer, UpdatePrayerRequest};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("prayertrack={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting PrayerTrack {}", env!("CARGO_PKG_VERSION"));

    // Credential commands don't need the database
    match &args.command {
        Command::SetApiKey { key } => {
            commands::store_api_key(key)?;
            println!("API key stored");
            return Ok(());
        }
        Command::ClearApiKey => {
            commands::clear_api_key()?;
            println!("API key removed");
            return Ok(());
        }
        _ => {}
    }

    let state = prayertrack::app::setup(&args.data_dir, SheetsConfig::from_args(&args.sheets))
        .await
        .context("Failed to initialize application")?;

    let identity = || -> Result<Identity> {
        args.identity
            .identity()
            .context("No user id given. Pass --user-id or set PRAYERTRACK_USER_ID.")
    };

    match args.command.clone() {
        Command::Sync => print_json(&commands::trigger_sync(&state, &identity()?).await?),
        Command::Status => print_json(&commands::sync_status(&state).await),
        Command::SheetInfo => print_json(&commands::spreadsheet_info(&state).await?),
        Command::List {
            status,
            date_from,
            date_to,
            team_member,
            page,
            limit,
        } => {
            let query = commands::ListPrayersQuery {
                status: Some(status),
                date_from,
                date_to,
                team_member,
                page: Some(page),
                limit: Some(limit),
            };
            print_json(&commands::list_prayers(&state, &identity()?, query).await?)
        }
        Command::Show { id } => print_json(&commands::get_prayer(&state, &identity()?, &id).await?),
        Command::Add {
            content,
            title,
            petitioner,
            private,
        } => {
            let req = NewPrayer {
                title: title.unwrap_or_default(),
                content,
                petitioner,
                is_private: private,
                ..Default::default()
            };
            print_json(&commands::create_prayer(&state, &identity()?, req).await?)
        }
        Command::Answer { id, undo } => {
            print_json(&commands::mark_answered(&state, &identity()?, &id, !undo).await?)
        }
        Command::Edit {
            id,
            title,
            content,
            private,
        } => {
            let req = UpdatePrayerRequest {
                title,
                content,
                is_private: private,
                ..Default::default()
            };
            print_json(&commands::update_prayer(&state, &identity()?, &id, req).await?)
        }
        Command::Info => print_json(&serde_json::json!({
            "app": commands::get_app_info(&state),
            "sync": commands::get_sync_settings(&state).await?,
            "stored_api_key": commands::has_stored_api_key(),
        })),
        Command::Configure {
            sheet_names,
            batch_size,
            recency_months,
        } => {
            let mut sync = commands::get_sync_settings(&state).await?;
            if !sheet_names.is_empty() {
                sync.sheet_names = sheet_names;
            }
            if let Some(batch_size) = batch_size {
                sync.batch_size = batch_size;
            }
            if let Some(recency_months) = recency_months {
                sync.recency_months = recency_months;
            }
            commands::update_sync_settings(&state, sync.clone()).await?;
            print_json(&sync)
        }
        Command::SetApiKey { .. } | Command::ClearApiKey => Ok(()),
    }
}
