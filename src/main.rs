mod app;
mod cache;
mod catalog;
mod commands;
mod config;
mod event;
mod pagination;
mod query;
mod route;
mod ui;

use catalog::resolve::populate_single;
use catalog::{populate_all, CatalogClient};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sw9s")]
#[command(about = "A terminal UI for browsing SWAPI-style REST catalogs, inspired by k9s")]
#[command(version, args_conflicts_with_subcommands = true)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/sw9s/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Catalog root URL, e.g. https://swapi.dev/api/
  #[arg(long, global = true)]
  root: Option<String>,

  /// Category opened when no route is given
  #[arg(long)]
  category: Option<String>,

  /// Neither read nor write the response cache
  #[arg(long, global = true)]
  no_cache: bool,

  /// Start route: /, /:type or /:type/:id
  route: Option<String>,

  #[command(subcommand)]
  command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  /// Print the catalog's categories
  Categories,
  /// Print one page of a category
  List {
    category: String,
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    #[arg(short, long, default_value = "")]
    search: String,
  },
  /// Print one entity
  Show {
    category: String,
    id: String,
    /// Replace references with the entities they point to
    #[arg(long)]
    populate: bool,
    /// Resolve only this field
    #[arg(long, conflicts_with = "populate")]
    field: Option<String>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line overrides
  config.apply_overrides(args.root, args.category, args.no_cache)?;

  if let Some(command) = args.command {
    let client = CatalogClient::new(&config)?;
    return run_command(&client, command).await;
  }

  let route = route::Route::parse(args.route.as_deref().unwrap_or("/")).map_err(|e| eyre!(e))?;
  info!(root = %config.root, %route, "starting");

  // Initialize and run the app
  let mut app = app::App::new(config, &route)?;
  app.run().await?;

  Ok(())
}

async fn run_command(client: &CatalogClient, command: Cmd) -> Result<()> {
  let output = match command {
    Cmd::Categories => {
      let categories = client.get_categories().await?;
      let map: Map<String, Value> = categories
        .iter()
        .map(|(name, url)| (name.to_string(), Value::String(url.to_string())))
        .collect();
      Value::Object(map)
    }
    Cmd::List {
      category,
      page,
      search,
    } => serde_json::to_value(client.get_resources(&category, page, &search).await?)?,
    Cmd::Show {
      category,
      id,
      populate,
      field,
    } => {
      let entity = client.get_resource_details(&category, &id).await?;
      if populate {
        populate_all(client, &entity).await?.to_json()
      } else if let Some(field) = field {
        let value = entity
          .get(&field)
          .ok_or_else(|| eyre!("{}/{} has no field {}", category, id, field))?;
        populate_single(client, &field, value).await?.to_json()
      } else {
        Value::Object(entity.into_inner())
      }
    }
  };

  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

/// Log to a daily file; the terminal belongs to the UI.
///
/// Returns `None` when there is no data directory to write to. The guard
/// flushes the writer on drop and must live until exit.
fn init_logging() -> Option<WorkerGuard> {
  let log_dir = dirs::data_dir()?.join("sw9s").join("logs");
  std::fs::create_dir_all(&log_dir).ok()?;

  let file = tracing_appender::rolling::daily(&log_dir, "sw9s.log");
  let (writer, guard) = tracing_appender::non_blocking(file);

  let filter = EnvFilter::try_from_env("SW9S_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .init();

  Some(guard)
}
