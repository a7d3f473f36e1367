//! Remote connection settings.
//!
//! `mcurl` and `apikey` can come from the process environment, from the
//! user's `~/.materialscommons/config.json`, or from the command line, in
//! that order: a setting found earlier overrides everything after it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default API base url when nothing else supplies one.
pub const DEFAULT_MCURL: &str = "https://materialscommons.org/api";

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    mcurl: Option<String>,
    #[serde(default)]
    apikey: Option<String>,
}

/// Resolved connection settings.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub mcurl: String,
    pub apikey: String,
}

/// Resolve settings with the CLI-provided values as the final fallback.
pub fn resolve_remote_settings(cli_mcurl: &str, cli_apikey: &str) -> RemoteSettings {
    let file = config_file_path().and_then(|path| read_config_file(&path));
    resolve_from(
        std::env::var("mcurl").ok(),
        std::env::var("apikey").ok(),
        file,
        cli_mcurl,
        cli_apikey,
    )
}

fn resolve_from(
    env_mcurl: Option<String>,
    env_apikey: Option<String>,
    file: Option<ConfigFile>,
    cli_mcurl: &str,
    cli_apikey: &str,
) -> RemoteSettings {
    let file = file.unwrap_or_default();
    RemoteSettings {
        mcurl: env_mcurl
            .or(file.mcurl)
            .unwrap_or_else(|| cli_mcurl.to_string()),
        apikey: env_apikey
            .or(file.apikey)
            .unwrap_or_else(|| cli_apikey.to_string()),
    }
}

fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".materialscommons").join("config.json"))
}

fn read_config_file(path: &Path) -> Option<ConfigFile> {
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}
