use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use chrono::FixedOffset;
use serde::Deserialize;

use crate::auth::token_auth::AuthConfig;

#[derive(Deserialize, Clone, Debug)]
pub struct Blog {
    pub name: String,
    pub title: String,
    /// `+HH:MM` or `-HH:MM`
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Auth {
    pub username: String,
    pub password: String,
    pub secret_key: String,
    pub cookie_name: String,
    #[serde(default = "default_token_validity")]
    pub token_validity_secs: i64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Paths {
    pub public_dir: PathBuf,
    /// JSON snapshot of posts and tags. Data lives only in memory when absent.
    pub data_file: Option<PathBuf>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub blog: Blog,
    pub auth: Auth,
    pub paths: Paths,
    pub server: Server,
    pub log: Option<Log>,
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_token_validity() -> i64 {
    24 * 3600
}

impl Config {
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            username: self.auth.username.clone(),
            password: self.auth.password.clone(),
            secret_key: self.auth.secret_key.clone(),
            cookie_name: self.auth.cookie_name.clone(),
            token_validity_secs: self.auth.token_validity_secs,
        }
    }

    pub fn utc_offset(&self) -> io::Result<FixedOffset> {
        parse_utc_offset(&self.blog.utc_offset)
    }

    /// Applies `BLOGO_*` variables on top of the file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> io::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup("BLOGO_USERNAME") {
            self.auth.username = username;
        }
        if let Some(password) = lookup("BLOGO_PASSWORD") {
            self.auth.password = password;
        }
        if let Some(secret_key) = lookup("BLOGO_SECRET_KEY") {
            self.auth.secret_key = secret_key;
        }
        if let Some(cookie_name) = lookup("BLOGO_COOKIE_NAME") {
            self.auth.cookie_name = cookie_name;
        }
        if let Some(port) = lookup("BLOGO_PORT") {
            self.server.port = port.parse().map_err(|e| io::Error::new(
                ErrorKind::InvalidInput, format!("Invalid BLOGO_PORT {}: {}", port, e)))?;
        }
        Ok(())
    }
}

pub fn parse_utc_offset(offset: &str) -> io::Result<FixedOffset> {
    offset.parse::<FixedOffset>().map_err(|e| io::Error::new(
        ErrorKind::InvalidInput, format!("Invalid utc_offset {}, expected +HH:MM or -HH:MM: {}", offset, e)))
}

fn parse_path(path: PathBuf) -> io::Result<PathBuf> {
    let Some(str_path) = path.to_str() else {
        return Ok(path);
    };
    if !str_path.starts_with("${exe_dir}") {
        return Ok(path);
    }

    let cur_exe = env::current_exe()?;
    let exe_dir = cur_exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy())))
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths.public_dir = parse_path(cfg.paths.public_dir)?;
    cfg.paths.data_file = cfg.paths.data_file.map(parse_path).transpose()?;
    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}
