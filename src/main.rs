mod api;
mod app;
mod cache;
mod commands;
mod config;
mod entities;
mod event;
mod form;
mod pages;
mod query;
mod table;
#[cfg(test)]
mod test_support;
mod ui;
mod workflow;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::ApiClient;
use crate::app::{App, Banner};
use crate::cache::TtlCache;
use crate::commands::{CommandAction, Screen};
use crate::query::DataSource;
use crate::workflow::PageContext;

/// Environment variable holding the log filter (`info`, `scolaire=debug`, ...)
const LOG_ENV: &str = "SCOLAIRE_LOG";

#[derive(Parser, Debug)]
#[command(name = "scolaire")]
#[command(about = "A terminal admin client for the school-management backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/scolaire/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// School id, overriding school_id from the config
  #[arg(short, long)]
  school: Option<i64>,

  /// School year id, overriding year_id from the config
  #[arg(short, long)]
  year: Option<i64>,

  /// Screen to open first (personnel, profils, enquetes, quiz, affectations)
  #[arg(long, default_value = "personnel")]
  view: String,
}

/// Log to a daily file; the terminal belongs to the UI.
fn init_logging() -> Result<WorkerGuard> {
  let dir = dirs::data_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("scolaire")
    .join("logs");
  std::fs::create_dir_all(&dir).map_err(|e| eyre!("Failed to create log dir {}: {}", dir.display(), e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, "scolaire.log"));
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .init();
  Ok(guard)
}

fn initial_screen(name: &str) -> Result<Screen> {
  match commands::find(name).map(|c| c.action) {
    Some(CommandAction::Open(screen)) => Ok(screen),
    _ => Err(eyre!("Unknown view {:?}", name)),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging()?;

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(school) = args.school {
    config.school_id = school;
  }
  if let Some(year) = args.year {
    config.year_id = year;
  }
  let screen = initial_screen(&args.view)?;

  info!(api = %config.api.url, school = config.school_id, year = config.year_id, "starting");

  let client = ApiClient::new(&config.api)?;
  let cache = Arc::new(TtlCache::new(config.cache.ttl()));
  debug!(ttl_secs = cache.ttl().as_secs(), "cache ready");
  let ctx = PageContext {
    source: DataSource::new(client, cache),
    school_id: config.school_id,
    year_id: config.year_id,
    download_dir: config.download_dir(),
  };
  let banner = Banner {
    title: config.display_title(),
    context: format!("École {} · Année {}", config.school_id, config.year_id),
  };

  let mut app = App::new(ctx, config.table.page_size, banner, screen);
  app.run().await?;

  info!("exiting");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_initial_screen() {
    assert_eq!(initial_screen("enquetes").unwrap(), Screen::Surveys);
    assert_eq!(initial_screen("aff").unwrap(), Screen::Affectations);
    assert!(initial_screen("quit").is_err());
    assert!(initial_screen("bulletins").is_err());
  }

  #[test]
  fn test_args_parse() {
    let args = Args::parse_from(["scolaire", "--school", "12", "-y", "3", "--view", "quiz"]);
    assert_eq!(args.school, Some(12));
    assert_eq!(args.year, Some(3));
    assert_eq!(args.view, "quiz");
    assert!(args.config.is_none());
  }
}
