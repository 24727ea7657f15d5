use std::path::PathBuf;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod api;
mod attendance;
mod columns;
mod config;
mod dates;
mod error;
mod headers;
mod models;
mod report;
mod roster;
mod source;

use crate::api::{AppState, ConfigPresence};
use crate::config::{AttendancePolicy, PolicyArgs, SourceArgs};
use crate::error::ApiError;
use crate::models::AttendanceSummary;
use crate::source::GridSource;

#[derive(Parser)]
#[command(name = "attendance-calendar")]
#[command(about = "Serves spreadsheet attendance records as monthly calendars", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    policy: PolicyArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
    },
    /// Write a markdown attendance report for one student
    Report {
        #[arg(long)]
        roll: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn build_state(source: SourceArgs, policy: PolicyArgs) -> anyhow::Result<AppState> {
    let config_presence = ConfigPresence {
        sheet_id: source.sheet_id.is_some(),
        api_key: source.api_key.is_some(),
        access_token: source.access_token.is_some(),
        data_dir: source.data_dir.is_dir(),
    };

    Ok(AppState {
        source: GridSource::from_args(&source)?,
        students_range: source.students_range,
        attendance_range: source.attendance_range,
        policy: AttendancePolicy::from(policy),
        config_presence,
    })
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let state = build_state(cli.source, cli.policy)?;

    match cli.command {
        Commands::Serve { host, port } => {
            tracing::info!(
                %host,
                port,
                source = state.source.kind(),
                students = %state.students_range,
                attendance = %state.attendance_range,
                "starting attendance API"
            );
            let state = web::Data::new(state);
            HttpServer::new(move || {
                App::new()
                    .app_data(state.clone())
                    .wrap(Logger::default())
                    .configure(api::configure)
            })
            .bind((host.as_str(), port))
            .with_context(|| format!("failed to bind {host}:{port}"))?
            .run()
            .await
            .context("HTTP server stopped with an error")?;
        }
        Commands::Report { roll, out } => {
            let student = state.student(&roll).await?;
            let attendance = match state.attendance(&roll).await {
                Ok(summary) => summary,
                Err(err @ (ApiError::NotFound(_) | ApiError::BadRequest(_))) => {
                    tracing::warn!(reason = %err, "no usable attendance, reporting empty calendar");
                    AttendanceSummary::empty()
                }
                Err(err) => return Err(err.into()),
            };
            let report = report::build_report(&student, &attendance);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
