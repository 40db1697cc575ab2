use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use poise::serenity_prelude as serenity;
use serde::Deserialize;

use crate::api::{steam_api, steam_charts};
use crate::util::dates;
use crate::{fmt, Error};

const CONFIG_PATH_VAR: &str = "STEAM_NOW_CONFIG";
const CONFIG_FILE_NAME: &str = "steam_now.toml";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
struct FileConfig {
    pub token_var: String,
    pub guild_id: Option<u64>,
    pub nickname_prefix: String,
    pub rotate_every_sec: u64,
    pub refresh_data_every_sec: u64,
    pub http_timeout_sec: u64,
    pub online_status: serenity::OnlineStatus,
    pub steam_api_url: String,
    pub steam_charts_url: String,
    pub log: FileLogConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            token_var: "DISCORD_TOKEN".to_string(),
            guild_id: None,
            nickname_prefix: "Steam Now".to_string(),
            rotate_every_sec: 60,
            refresh_data_every_sec: 300,
            http_timeout_sec: 20,
            online_status: serenity::OnlineStatus::Online,
            steam_api_url: steam_api::MOST_PLAYED_URL.to_string(),
            steam_charts_url: steam_charts::TOP_GAMES_URL.to_string(),
            log: FileLogConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
struct FileLogConfig {
    pub level: String,
    pub path: Option<String>,
    pub json_path: Option<String>,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            path: None,
            json_path: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: String,
    pub path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord_token: String,
    pub guild_id: Option<u64>,
    pub nickname_prefix: String,
    pub rotate_every: Duration,
    pub refresh_every: Duration,
    pub http_timeout: Duration,
    pub online_status: serenity::OnlineStatus,
    pub steam_api_url: String,
    pub steam_charts_url: String,
    pub log: LogConfig,
}

impl AppConfig {
    /// Nickname updates need both a guild and a non-empty prefix.
    pub fn nickname_prefix(&self) -> Option<&str> {
        match self.guild_id {
            Some(_) if !self.nickname_prefix.is_empty() => Some(&self.nickname_prefix),
            _ => None,
        }
    }
}

/// Reads the optional TOML file, then lets the environment override it.
pub fn load_config() -> Result<AppConfig, Error> {
    let file_config = match config_file_path()? {
        Some(path) => {
            let s = fs::read_to_string(&path)
                .map_err(|e| fmt!("Could not read config file {}: {}", path.display(), e))?;
            toml::from_str(&s)?
        }
        None => FileConfig::default(),
    };

    resolve(file_config, |key| env::var(key).ok())
}

fn config_file_path() -> Result<Option<PathBuf>, Error> {
    if let Ok(path) = env::var(CONFIG_PATH_VAR) {
        return Ok(Some(expand_tilde(&path)?));
    }

    let exe_path = env::current_exe()?;
    let Some(dir) = exe_path.parent() else {
        return Err("failed to determine executable directory".into());
    };
    let path = dir.join(CONFIG_FILE_NAME);
    Ok(path.is_file().then_some(path))
}

fn resolve(cfg: FileConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig, Error> {
    let discord_token = lookup(&cfg.token_var)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| fmt!("Discord token not set in {}", cfg.token_var))?;

    let guild_id = match lookup("GUILD_ID") {
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| fmt!("GUILD_ID is not a valid id ({raw}): {e}"))?,
        ),
        None => cfg.guild_id,
    };

    let nickname_prefix = lookup("NICKNAME_PREFIX").unwrap_or(cfg.nickname_prefix);
    let rotate_every = seconds(
        lookup("ROTATE_EVERY_SEC"),
        cfg.rotate_every_sec,
        "ROTATE_EVERY_SEC",
    )?;
    let refresh_every = seconds(
        lookup("REFRESH_DATA_EVERY_SEC"),
        cfg.refresh_data_every_sec,
        "REFRESH_DATA_EVERY_SEC",
    )?;

    let mut file_log = cfg.log;
    if let Some(level) = lookup("LOG_LEVEL") {
        file_log.level = level;
    }

    Ok(AppConfig {
        discord_token,
        guild_id,
        nickname_prefix,
        rotate_every,
        refresh_every,
        http_timeout: Duration::from_secs(cfg.http_timeout_sec),
        online_status: cfg.online_status,
        steam_api_url: cfg.steam_api_url,
        steam_charts_url: cfg.steam_charts_url,
        log: build_log_config(file_log)?,
    })
}

fn seconds(raw: Option<String>, default: u64, key: &str) -> Result<Duration, Error> {
    let secs = match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| fmt!("{key} is not a whole number of seconds ({raw}): {e}"))?,
        None => default,
    };
    if secs == 0 {
        return Err(fmt!("{key} must be at least 1 second").into());
    }
    Ok(Duration::from_secs(secs))
}

fn expand_tilde(path: &str) -> Result<PathBuf, Error> {
    if path.starts_with("~/") {
        let home = env::var("HOME")?;
        Ok(PathBuf::from(path.replacen("~", &home, 1)))
    } else {
        Ok(PathBuf::from(path))
    }
}

fn build_log_config(file_log: FileLogConfig) -> Result<LogConfig, Error> {
    let path = file_log.path.as_deref().map(log_file_path).transpose()?;
    let json_path = file_log.json_path.as_deref().map(log_file_path).transpose()?;

    Ok(LogConfig {
        level: file_log.level,
        path,
        json_path,
    })
}

fn log_file_path(cfg_path: &str) -> Result<PathBuf, Error> {
    let path = log_file_replacements(cfg_path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(fmt!("Log file directory does not exist: {}", parent.display()).into());
        }
    }
    if path.exists() && !path.is_file() {
        return Err(fmt!("Log path exists but is not a file: {cfg_path}").into());
    }
    Ok(path)
}

fn log_file_replacements(cfg_path: &str) -> Result<PathBuf, Error> {
    let date_str = dates::local_date_yyyy_mm_dd();
    let replaced = cfg_path.replace("{DATE}", &date_str);
    expand_tilde(&replaced)
}
