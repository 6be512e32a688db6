use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use smsforward_core::{to_unified, Region, UnifiedNumber};
use thiserror::Error;

const APP_DIR: &str = "smsforward";
const CONFIG_FILENAME: &str = "config.toml";
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub region: Region,
    /// As written; national forms resolve against the effective region, see
    /// [`AppConfig::own_number_in`].
    pub own_number: Option<String>,
    pub transport: TransportConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Print outgoing messages as JSON lines on stdout.
    Stdout,
    Command { argv: Vec<String>, timeout_seconds: u64 },
    Http { url: String, timeout_seconds: u64 },
}

#[derive(Debug, Clone)]
pub struct NotificationsConfig {
    pub enabled: bool,
    pub backend: NotificationBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationBackend {
    /// Failure notices on stderr.
    #[serde(alias = "stdout")]
    Console,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TransportKind {
    Stdout,
    Command,
    Http,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: locale_region().unwrap_or_default(),
            own_number: None,
            transport: TransportConfig::Stdout,
            notifications: NotificationsConfig {
                enabled: false,
                backend: NotificationBackend::Console,
            },
        }
    }
}

impl AppConfig {
    /// Normalizes `own_number` in `region`, which may differ from
    /// [`AppConfig::region`] when a command line override is in effect.
    pub fn own_number_in(&self, region: &Region) -> Result<Option<UnifiedNumber>> {
        self.own_number
            .as_deref()
            .map(|raw| {
                to_unified(raw, region).map_err(|_| ConfigError::InvalidOwnNumber(raw.to_string()))
            })
            .transpose()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("unsupported region: {0}")]
    InvalidRegion(String),
    #[error("invalid own_number value: {0}")]
    InvalidOwnNumber(String),
    #[error("invalid transport.{field}: {message}")]
    InvalidTransportField {
        field: &'static str,
        message: String,
    },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    region: Option<String>,
    own_number: Option<String>,
    transport: Option<TransportFile>,
    notifications: Option<NotificationsFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransportFile {
    kind: Option<TransportKind>,
    command: Option<Vec<String>>,
    url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NotificationsFile {
    enabled: Option<bool>,
    backend: Option<NotificationBackend>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path.clone()) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

/// Region named by the first set locale variable, if it is one we know.
pub fn locale_region() -> Option<Region> {
    LOCALE_VARS
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .and_then(|value| Region::from_locale(&value))
}

pub fn parse_region(raw: &str) -> Result<Region> {
    Region::from_code(raw).ok_or_else(|| ConfigError::InvalidRegion(raw.trim().to_string()))
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(region) = parsed.region {
        config.region = parse_region(&region)?;
    }

    if let Some(own_number) = parsed.own_number {
        let trimmed = own_number.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidOwnNumber(own_number));
        }
        config.own_number = Some(trimmed.to_string());
    }

    if let Some(transport) = parsed.transport {
        config.transport = merge_transport(transport)?;
    }

    if let Some(notifications) = parsed.notifications {
        if let Some(enabled) = notifications.enabled {
            config.notifications.enabled = enabled;
        }
        if let Some(backend) = notifications.backend {
            config.notifications.backend = backend;
        }
    }

    Ok(config)
}

fn merge_transport(file: TransportFile) -> Result<TransportConfig> {
    let timeout_seconds = file.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    if timeout_seconds == 0 || timeout_seconds > MAX_TIMEOUT_SECONDS {
        return Err(ConfigError::InvalidTransportField {
            field: "timeout_seconds",
            message: format!("must be between 1 and {MAX_TIMEOUT_SECONDS}"),
        });
    }

    match file.kind.unwrap_or(TransportKind::Stdout) {
        TransportKind::Stdout => Ok(TransportConfig::Stdout),
        TransportKind::Command => {
            let argv = file.command.unwrap_or_default();
            let program = argv.first().map(|value| value.trim()).unwrap_or_default();
            if program.is_empty() {
                return Err(ConfigError::InvalidTransportField {
                    field: "command",
                    message: "must name a program".to_string(),
                });
            }
            Ok(TransportConfig::Command {
                argv,
                timeout_seconds,
            })
        }
        TransportKind::Http => {
            let url = file.url.unwrap_or_default().trim().to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidTransportField {
                    field: "url",
                    message: "must be an http(s) URL".to_string(),
                });
            }
            Ok(TransportConfig::Http {
                url,
                timeout_seconds,
            })
        }
    }
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
