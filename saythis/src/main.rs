#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::path::Path;

use anyhow::Context;
use args::{Args, Command, ConfigAction};
use clap::Parser;
use saythis_app::{AppError, Application};
use saythis_config::ProviderSettings;
use serde_json::Value;
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    saythis_telemetry::init(&args.log, args.log_format.into())?;

    let mut app = match &args.data_dir {
        Some(dir) => Application::open(dir),
        None => Application::open_default(),
    }
    .map_err(user_error)?;

    tracing::debug!(data_dir = %app.data_dir().display(), "starting saythis");

    match args.command {
        Command::Say { text, file, save_as } => {
            let text = read_text(&text, file.as_deref()).await?;
            let path = app.generate_audio(&text).await.map_err(user_error)?;

            if let Some(target) = save_as {
                tokio::fs::copy(&path, &target)
                    .await
                    .with_context(|| format!("failed to save audio to {}", target.display()))?;
                println!("{}", target.display());
            } else {
                println!("{}", path.display());
            }
        }
        Command::Usage => {
            let usage = app.character_usage().await.map_err(user_error)?;
            println!("{}: {usage}", app.selected_service());
        }
        Command::Providers => print_providers(&app),
        Command::Select { name } => {
            app.set_selected_service(&name).map_err(user_error)?;

            if let Some(reason) = app.readiness_reason() {
                println!("{name} selected (not ready: {reason})");
            } else {
                println!("{name} selected");
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                let settings = app.service_config().map_err(user_error)?;
                let shown = serde_json::json!({
                    "selected_provider": app.selected_service(),
                    "settings": masked(settings),
                });
                println!("{}", serde_json::to_string_pretty(&shown)?);
            }
            ConfigAction::Set { key, value } => {
                let mut settings = app.service_config().map_err(user_error)?.clone();
                settings
                    .set(&key, parse_value(&key, &value))
                    .map_err(|e| user_error(e.into()))?;
                app.set_service_config(settings).map_err(user_error)?;

                println!("{} {key} updated", app.selected_service());
            }
            ConfigAction::Path => println!("{}", app.config_path().display()),
        },
    }

    Ok(())
}

/// Turn a facade error into the message a user should see
#[allow(clippy::needless_pass_by_value)]
fn user_error(e: AppError) -> anyhow::Error {
    tracing::debug!(category = ?e.category(), error = ?e, "command failed");
    anyhow::anyhow!(e.client_message())
}

async fn read_text(words: &[String], file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(file) = file {
        return tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()));
    }

    if !words.is_empty() {
        return Ok(words.join(" "));
    }

    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("failed to read text from stdin")?;

    Ok(text)
}

fn print_providers(app: &Application) {
    for name in app.providers() {
        let marker = if name == app.selected_service() { "*" } else { " " };
        let configured = app
            .settings_for(name)
            .is_some_and(ProviderSettings::is_configured);

        let status = match (name == app.selected_service(), app.is_service_ready(), configured) {
            (true, true, _) => "ready",
            (true, false, _) => "not ready",
            (false, _, true) => "configured",
            (false, _, false) => "not configured",
        };

        println!("{marker} {name} ({status})");
    }
}

/// Settings as JSON with all but the last four credential characters hidden
fn masked(settings: &ProviderSettings) -> Value {
    let mut settings = settings.clone();
    settings.credential = mask(&settings.credential);
    serde_json::to_value(settings).unwrap_or(Value::Null)
}

fn mask(credential: &str) -> String {
    let chars: Vec<char> = credential.chars().collect();
    if chars.is_empty() {
        return String::new();
    }

    let visible = chars.len().saturating_sub(4).max(chars.len() / 2);
    let tail: String = chars[visible..].iter().collect();

    format!("{}{tail}", "*".repeat(visible))
}

/// Common fields are always strings; tunables are parsed as JSON when possible
fn parse_value(key: &str, raw: &str) -> Value {
    match key {
        "credential" | "file_extension" => Value::String(raw.to_owned()),
        _ => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned())),
    }
}
