//! `parking`: command-line client for the parking reservation server.
//!
//! # Usage
//!
//! ```text
//! parking --url http://localhost:8080 submit --name "Juan de la Cruz" \
//!   --national-id 4455667 --plate AB-123 --unit Anestesia --day Lunes --hour 8
//! parking report --unit Anestesia --top 10
//! parking export --day Lunes,Martes -o lunes_martes.csv
//! ```

mod client;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client::{ApiClient, ApiConfig, Filter};
use parking_core::{
  record::{Hour, Weekday},
  submission::SubmissionForm,
};
use serde::Deserialize;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "parking", about = "Command-line client for the parking reservation server")]
struct Cli {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the parking server (default: http://localhost:8080).
  #[arg(long, env = "PARKING_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Reserve one or more day×hour slots.
  Submit(SubmitArgs),
  /// Print the dashboard summary.
  Report {
    #[command(flatten)]
    filter: FilterArgs,
    /// Number of top requesters to list.
    #[arg(long)]
    top:    Option<usize>,
  },
  /// Download the filtered records as CSV.
  Export {
    #[command(flatten)]
    filter: FilterArgs,
    /// Output file (default: the name suggested by the server).
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
  },
}

#[derive(Args, Debug)]
struct SubmitArgs {
  #[arg(long)]
  name:          String,
  #[arg(long)]
  national_id:   String,
  #[arg(long)]
  plate:         String,
  #[arg(long)]
  unit:          String,
  /// Day to reserve (Lunes..Domingo); repeat or comma-separate.
  #[arg(long = "day", value_delimiter = ',', required = true, value_parser = parse_day)]
  days:          Vec<Weekday>,
  /// Hour to reserve (0..=24); repeat or comma-separate.
  #[arg(long = "hour", value_delimiter = ',', required = true, value_parser = parse_hour)]
  hours:         Vec<Hour>,
  #[arg(long, default_value = "")]
  phone:         String,
  #[arg(long, default_value = "")]
  email:         String,
  #[arg(long, default_value = "")]
  vehicle_model: String,
  #[arg(long, default_value = "")]
  color:         String,
  #[arg(long = "box", default_value = "")]
  box_:          String,
  #[arg(long, default_value = "")]
  place:         String,
  #[arg(long, default_value = "")]
  note:          String,
}

impl From<SubmitArgs> for SubmissionForm {
  fn from(a: SubmitArgs) -> Self {
    SubmissionForm {
      name:          a.name,
      national_id:   a.national_id,
      phone:         a.phone,
      email:         a.email,
      vehicle_model: a.vehicle_model,
      color:         a.color,
      plate:         a.plate,
      unit:          a.unit,
      box_:          a.box_,
      place:         a.place,
      note:          a.note,
      days:          a.days,
      hours:         a.hours,
    }
  }
}

#[derive(Args, Debug)]
struct FilterArgs {
  /// Only these units; repeat or comma-separate.
  #[arg(long = "unit", value_delimiter = ',')]
  units: Vec<String>,
  /// Only these days; repeat or comma-separate.
  #[arg(long = "day", value_delimiter = ',', value_parser = parse_day)]
  days:  Vec<Weekday>,
  /// Only these hours; repeat or comma-separate.
  #[arg(long = "hour", value_delimiter = ',', value_parser = parse_hour)]
  hours: Vec<Hour>,
}

impl From<FilterArgs> for Filter {
  fn from(a: FilterArgs) -> Self {
    Filter {
      units: a.units,
      days:  a.days.into_iter().map(|d| d.as_str().to_owned()).collect(),
      hours: a.hours.into_iter().map(Hour::get).collect(),
    }
  }
}

fn parse_day(s: &str) -> Result<Weekday, String> { Weekday::parse(s).map_err(|e| e.to_string()) }

fn parse_hour(s: &str) -> Result<Hour, String> { s.parse().map_err(|e: parking_core::Error| e.to_string()) }

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &cli.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: cli
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
  };
  let client = ApiClient::new(api_config)?;

  match cli.command {
    Command::Submit(args) => {
      let created = client.submit(&args.into()).await?;
      println!("registered {} ({} slots)", created.registration_id, created.rows);
    }
    Command::Report { filter, top } => {
      let view = client.report(&filter.into(), top).await?;
      print!("{}", output::render_report(&view));
    }
    Command::Export { filter, output } => {
      let export = client.export(&filter.into()).await?;
      let path = output
        .or_else(|| export.filename.clone().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("formularios_filtrado.csv"));
      std::fs::write(&path, &export.bytes)
        .with_context(|| format!("writing {}", path.display()))?;
      println!("wrote {}", path.display());
    }
  }

  Ok(())
}
