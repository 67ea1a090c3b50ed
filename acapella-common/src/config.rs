//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration, merged from CLI, environment, and config file.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding acapella.db
    pub root_folder: PathBuf,
    /// Listen port
    pub port: u16,
    /// Emails elevated to master_admin on first sign-in
    pub master_admin_emails: Vec<String>,
}

impl ServiceConfig {
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join("acapella.db")
    }
}

/// Optional keys read from the TOML config file.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    root_folder: Option<String>,
    port: Option<u16>,
    #[serde(default)]
    master_admin_emails: Vec<String>,
}

/// Resolve service configuration with the priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve(cli_root: Option<&str>, cli_port: Option<u16>) -> Result<ServiceConfig> {
    let file = load_config_file()
        .and_then(|path| {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str::<FileConfig>(&content)
                .map_err(|e| Error::Config(format!("Invalid config file {:?}: {}", path, e)))
        })
        .unwrap_or_default();

    let root_folder = if let Some(path) = cli_root {
        PathBuf::from(path)
    } else if let Ok(path) = std::env::var("ACAPELLA_ROOT") {
        PathBuf::from(path)
    } else if let Some(path) = &file.root_folder {
        PathBuf::from(path)
    } else {
        default_root_folder()
    };

    let port = if let Some(p) = cli_port {
        p
    } else if let Ok(p) = std::env::var("ACAPELLA_PORT") {
        p.parse()
            .map_err(|_| Error::Config(format!("Invalid ACAPELLA_PORT: {}", p)))?
    } else {
        file.port.unwrap_or(5780)
    };

    let master_admin_emails = if let Ok(raw) = std::env::var("ACAPELLA_MASTER_ADMINS") {
        raw.split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        file.master_admin_emails
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect()
    };

    Ok(ServiceConfig {
        root_folder,
        port,
        master_admin_emails,
    })
}

/// Ensure the root folder exists before opening the database.
pub fn ensure_root_folder(config: &ServiceConfig) -> Result<()> {
    std::fs::create_dir_all(&config.root_folder)?;
    Ok(())
}

/// Locate the platform config file, if any.
fn load_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("acapella").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/acapella/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("acapella"))
        .unwrap_or_else(|| PathBuf::from("./acapella_data"))
}
