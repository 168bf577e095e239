//! formflow-sync
//!
//! Pulls FormFlow survey templates and their aggregated response statistics
//! and mirrors them into a local SQLite database.

use anyhow::{Result, bail};
use clap::Parser;
use formflow_sync::cli::{Cli, Command};
use formflow_sync::config::Config;
use formflow_sync::db::Database;
use formflow_sync::error::ActionError;
use formflow_sync::format::{self, OutputFormat};
use formflow_sync::logging::{self, LogTarget};
use formflow_sync::types::Notification;
use formflow_sync::wizard::{self, ImportWizard};
use std::path::Path;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::resolve(cli.config.as_deref().map(Path::new))?;
    if let Some(db_path) = &cli.database {
        config.storage.db_path = db_path.into();
    }
    debug!(db = %config.storage.db_path.display(), api = %config.api.base_url, "Configuration resolved");

    match cli.command {
        Command::Import(args) => {
            let db = open_database(&config)?;
            let (token, url) = args.resolve(&config.api);
            let wizard = ImportWizard::new(token, url).with_settings(config.api.clone());
            report(wizard.import(&db).await);
        }
        Command::TestConnection(args) => {
            let (token, url) = args.resolve(&config.api);
            let wizard = ImportWizard::new(token, url).with_settings(config.api.clone());
            report(wizard.test_connection().await);
        }
        Command::Refresh { template_id } => {
            let db = open_database(&config)?;
            report(wizard::refresh_template(&db, &config.api, &template_id).await);
        }
        Command::List { format } => {
            let db = open_database(&config)?;
            let templates = db.list_templates()?;
            match format {
                OutputFormat::Json => println!("{}", format::to_json(&templates)?),
                OutputFormat::Markdown => print!("{}", format::format_templates_markdown(&templates)),
            }
        }
        Command::Show {
            template_id,
            format,
        } => {
            let db = open_database(&config)?;
            let Some(detail) = db.get_template_detail(&template_id)? else {
                bail!("Template not found: {}", template_id);
            };
            match format {
                OutputFormat::Json => println!("{}", format::to_json(&detail)?),
                OutputFormat::Markdown => {
                    print!("{}", format::format_template_detail_markdown(&detail))
                }
            }
        }
        Command::Delete { template_id } => {
            let db = open_database(&config)?;
            if !db.delete_template(&template_id)? {
                bail!("Template not found: {}", template_id);
            }
            println!("Deleted template {}", template_id);
        }
        Command::Schema => {
            let db = open_database(&config)?;
            println!("{}", format::to_json(&db.get_schema()?)?);
        }
    }

    Ok(())
}

/// Only commands that read or write local state create the database.
fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.storage.db_path)?;
    debug!(db = %config.storage.db_path.display(), "Database opened");
    Ok(db)
}

/// Print an action's notification; failures exit non-zero with the message.
fn report(outcome: Result<Notification, ActionError>) {
    match outcome {
        Ok(notification) => {
            println!("{}", format::format_notification(&notification));
        }
        Err(err) => {
            warn!(
                code = ?err.code,
                message = %err.message,
                details = err.details.as_deref().unwrap_or(""),
                "Action failed"
            );
            let notification = Notification::danger("Action Failed", err.message.clone());
            eprintln!("{}", format::format_notification(&notification));
            std::process::exit(1);
        }
    }
}
