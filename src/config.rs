use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::timer::Preset;

const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "spin_focus";
const MIN_FRAME_INTERVAL_MS: u64 = 5;

#[derive(Debug)]
pub enum ConfigError {
	Io(PathBuf, std::io::Error),
	TomlDecode(PathBuf, toml::de::Error),
	Invalid(String),
}

impl Display for ConfigError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ConfigError::Io(path, err) => write!(f, "failed to read config {}: {err}", path.display()),
			ConfigError::TomlDecode(path, err) => {
				write!(f, "failed to parse config {}: {err}", path.display())
			}
			ConfigError::Invalid(message) => write!(f, "invalid config: {message}"),
		}
	}
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub log_level: String,
	pub log_dir: Option<PathBuf>,
	pub frame_interval_ms: u64,
	pub idle_revolution_secs: u64,
	pub default_preset: Preset,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			log_level: "info".to_string(),
			log_dir: None,
			frame_interval_ms: 33,
			idle_revolution_secs: 30,
			default_preset: Preset::Pomodoro,
		}
	}
}

impl Config {
	pub fn frame_interval(&self) -> Duration {
		Duration::from_millis(self.frame_interval_ms)
	}

	pub fn idle_revolution(&self) -> Duration {
		Duration::from_secs(self.idle_revolution_secs)
	}

	pub fn log_dir(&self) -> PathBuf {
		self.log_dir.clone().unwrap_or_else(|| state_dir().join("logs"))
	}

	fn validate(self) -> Result<Self, ConfigError> {
		if self.frame_interval_ms < MIN_FRAME_INTERVAL_MS {
			return Err(ConfigError::Invalid(format!(
				"frame_interval_ms must be at least {MIN_FRAME_INTERVAL_MS}, got {}",
				self.frame_interval_ms
			)));
		}
		if self.idle_revolution_secs == 0 {
			return Err(ConfigError::Invalid(
				"idle_revolution_secs must be greater than zero".to_string(),
			));
		}
		if self.log_level.trim().is_empty() {
			return Err(ConfigError::Invalid("log_level must not be empty".to_string()));
		}
		Ok(self)
	}
}

/// Loads the config from the first location that applies. A missing file means defaults.
pub fn load_config(cli_path: Option<PathBuf>) -> Result<Config, ConfigError> {
	let explicit = cli_path.is_some() || env::var_os("SPIN_FOCUS_CONFIG").is_some();
	let Some(path) = resolve_config_path(cli_path) else {
		return Ok(Config::default());
	};

	match fs::read_to_string(&path) {
		Ok(raw) => parse_config(&path, &raw),
		Err(err) if err.kind() == ErrorKind::NotFound && !explicit => Ok(Config::default()),
		Err(err) => Err(ConfigError::Io(path, err)),
	}
}

pub fn parse_config(path: &Path, raw: &str) -> Result<Config, ConfigError> {
	let config: Config =
		toml::from_str(raw).map_err(|err| ConfigError::TomlDecode(path.to_path_buf(), err))?;
	config.validate()
}

fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
	if let Some(path) = cli_path {
		return Some(path);
	}

	if let Some(path) = env::var_os("SPIN_FOCUS_CONFIG") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return Some(path);
		}
	}

	config_dir().map(|dir| dir.join(CONFIG_FILE))
}

fn config_dir() -> Option<PathBuf> {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("APPDATA") {
			return Some(PathBuf::from(path).join(APP_DIR));
		}
	}

	if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
		return Some(PathBuf::from(path).join(APP_DIR));
	}

	env::var_os("HOME").map(|path| PathBuf::from(path).join(".config").join(APP_DIR))
}

fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os("SPIN_FOCUS_STATE_DIR") {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".local").join("state").join(APP_DIR);
	}

	PathBuf::from(".spin_focus")
}
