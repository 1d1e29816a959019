//! Layered configuration.
//!
//! Values are resolved from, in increasing priority:
//!
//! 1. built-in defaults,
//! 2. `config.toml`, `config.yaml` or `config.json` in the user's
//!    configuration directory (`~/.config/tankobon` on Linux),
//! 3. a file passed explicitly, usually with `--config`,
//! 4. `TANKOBON_` environment variables, with `__` separating nested keys
//!    (`TANKOBON_JOIN__GAP=8`).

pub mod error;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use tankobon_imaging::{Color, DEFAULT_JPEG_QUALITY, EncodeOptions};

use crate::error::{ErrorKind, Result};

const APP_NAME: &str = "tankobon";
const ENV_PREFIX: &str = "TANKOBON_";
const CONFIG_FILES: [&str; 3] = ["config.toml", "config.yaml", "config.json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory archive paths are resolved against.
    pub root: PathBuf,
    /// Report what would be written without touching any file.
    pub dry_run: bool,
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    pub log: String,
    pub join: JoinConfig,
    pub encode: EncodeConfig,
    pub rename: RenameConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            dry_run: false,
            log: "info".to_string(),
            join: JoinConfig::default(),
            encode: EncodeConfig::default(),
            rename: RenameConfig::default(),
        }
    }
}

/// Defaults for joining two pages into a spread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// Pixels between the two halves.
    pub gap: u32,
    /// Hex colour of the gap.
    pub color: String,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self { gap: 0, color: "#ffffff".to_string() }
    }
}

impl JoinConfig {
    pub fn color(&self) -> Result<Color> {
        self.color.parse::<Color>().or_raise(|| ErrorKind::InvalidColor(self.color.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub jpeg_quality: u8,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self { jpeg_quality: DEFAULT_JPEG_QUALITY }
    }
}

impl EncodeConfig {
    pub fn options(&self) -> EncodeOptions {
        EncodeOptions { jpeg_quality: self.jpeg_quality }
    }
}

/// Rename rules applied when none are given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Rules of the form `/pattern/flags` or `/pattern/replacement/flags`.
    pub rules: Vec<String>,
    pub trim: bool,
    pub numbers: bool,
    pub flatten: bool,
}

impl Config {
    /// Resolve every layer and validate the result.
    ///
    /// # Errors
    ///
    /// Fails when `explicit` does not exist, a source does not parse, or a
    /// value is out of range.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(explicit)?)
    }

    /// The layered sources, without extracting them.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dirs) = ProjectDirs::from("", "", APP_NAME) {
            for name in CONFIG_FILES {
                figment = merge_file(figment, &dirs.config_dir().join(name));
            }
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
            }
            figment = merge_file(figment, path);
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.encode.jpeg_quality) {
            exn::bail!(ErrorKind::InvalidQuality(self.encode.jpeg_quality));
        }
        self.join.color()?;
        Ok(())
    }
}

/// Merge `path` with the parser its extension calls for. Missing files are
/// skipped.
fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}
