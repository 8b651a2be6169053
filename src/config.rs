use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_ROOT: &str = "https://swapi.dev/api/";
pub const DEFAULT_CATEGORY: &str = "people";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Root resource of the catalog (lists the categories)
  pub root: String,
  /// Category opened when no route is given
  pub default_category: String,
  /// Custom title for header (defaults to the root's domain if not set)
  pub title: Option<String>,
  /// Request timeout in seconds
  pub timeout_secs: u64,
  pub cache: CacheConfig,
  pub resolver: ResolverConfig,
  /// Columns shown per category, merged over the built-in defaults
  pub display: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      root: DEFAULT_ROOT.to_string(),
      default_category: DEFAULT_CATEGORY.to_string(),
      title: None,
      timeout_secs: 30,
      cache: CacheConfig::default(),
      resolver: ResolverConfig::default(),
      display: BTreeMap::new(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Persist responses to disk; when false nothing is cached
  pub enabled: bool,
  /// SQLite file (defaults to $XDG_DATA_HOME/sw9s/cache.db)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
  /// Upper bound on concurrent fetches per reference list (unset = unbounded)
  pub max_concurrency: Option<usize>,
}

/// Built-in table columns for the SWAPI categories.
const DEFAULT_DISPLAY: &[(&str, &[&str])] = &[
  (
    "people",
    &["name", "height", "mass", "gender", "birth_year"],
  ),
  (
    "planets",
    &["name", "climate", "terrain", "population", "diameter"],
  ),
  (
    "films",
    &["title", "episode_id", "director", "producer", "release_date"],
  ),
  (
    "species",
    &["name", "classification", "designation", "language", "average_lifespan"],
  ),
  (
    "vehicles",
    &["name", "model", "manufacturer", "vehicle_class", "crew"],
  ),
  (
    "starships",
    &["name", "model", "manufacturer", "starship_class", "crew"],
  ),
];

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./sw9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/sw9s/config.yaml
  ///
  /// With no file found the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("sw9s.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("sw9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  /// Parse and validate YAML config text.
  pub fn parse(contents: &str) -> Result<Self> {
    // An empty document deserializes as unit, not as an empty mapping
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }

    let config: Config = serde_yaml::from_str(contents)?;
    config.validate()?;
    Ok(config)
  }

  /// Apply command line overrides, then validate the result again.
  pub fn apply_overrides(
    &mut self,
    root: Option<String>,
    category: Option<String>,
    no_cache: bool,
  ) -> Result<()> {
    if let Some(root) = root {
      self.root = root;
    }
    if let Some(category) = category {
      self.default_category = category;
    }
    if no_cache {
      self.cache.enabled = false;
    }
    self.validate()
  }

  fn validate(&self) -> Result<()> {
    let root = ::url::Url::parse(&self.root).map_err(|e| eyre!("Invalid root URL {}: {}", self.root, e))?;
    if !matches!(root.scheme(), "http" | "https") {
      return Err(eyre!("Root URL must be http or https: {}", self.root));
    }
    if self.default_category.trim().is_empty() {
      return Err(eyre!("default_category must not be empty"));
    }
    Ok(())
  }

  /// Columns to show for a category. Unknown categories get `name` only.
  pub fn columns_for(&self, category: &str) -> Vec<String> {
    if let Some(columns) = self.display.get(category) {
      return columns.clone();
    }

    DEFAULT_DISPLAY
      .iter()
      .find(|(name, _)| *name == category)
      .map(|(_, columns)| columns.iter().map(|c| c.to_string()).collect())
      .unwrap_or_else(|| vec!["name".to_string()])
  }

  /// Header title: configured title, else the root's host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    ::url::Url::parse(&self.root)
      .ok()
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| self.root.clone())
  }
}
