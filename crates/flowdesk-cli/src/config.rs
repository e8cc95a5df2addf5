//! Runtime settings: flags and environment over the config file over
//! defaults.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use flowdesk_api::UpdateMethod;
use flowdesk_core::{AuthScheme, Connection, DEFAULT_EXECUTION_LIMIT, DEFAULT_LIST_LIMIT};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "flowdesk.toml";

// ── Flags ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
    /// API key in the configured header
    ApiKey,
    /// `Authorization: Bearer <key>`
    Bearer,
}

impl From<AuthArg> for AuthScheme {
    fn from(arg: AuthArg) -> Self {
        match arg {
            AuthArg::ApiKey => AuthScheme::ApiKey,
            AuthArg::Bearer => AuthScheme::Bearer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UpdateMethodArg {
    Patch,
    Put,
}

impl From<UpdateMethodArg> for UpdateMethod {
    fn from(arg: UpdateMethodArg) -> Self {
        match arg {
            UpdateMethodArg::Patch => UpdateMethod::Patch,
            UpdateMethodArg::Put => UpdateMethod::Put,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Server host, optionally with an http:// or https:// prefix
    #[arg(long, global = true, env = "FLOWDESK_HOST")]
    pub host: Option<String>,

    /// Server port (default 5678 for local hosts, none otherwise; 0 leaves it out)
    #[arg(long, global = true, env = "FLOWDESK_PORT")]
    pub port: Option<u16>,

    /// API path below the host
    #[arg(long, global = true, env = "FLOWDESK_BASE_PATH")]
    pub base_path: Option<String>,

    /// API key or bearer token
    #[arg(long, global = true, env = "FLOWDESK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, env = "FLOWDESK_AUTH", value_enum)]
    pub auth: Option<AuthArg>,

    /// Header carrying the API key
    #[arg(long, global = true, env = "FLOWDESK_API_KEY_HEADER")]
    pub api_key_header: Option<String>,

    /// Verb used to write an edited workflow back
    #[arg(long, global = true, value_enum)]
    pub update_method: Option<UpdateMethodArg>,
}

// ── Config file ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub connection: ConnectionSection,
    pub editor: EditorSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_path: Option<String>,
    pub api_key: Option<String>,
    pub auth: Option<AuthScheme>,
    pub api_key_header: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditorSection {
    pub update_method: Option<UpdateMethod>,
    pub list_limit: Option<u32>,
    pub execution_limit: Option<u32>,
}

pub fn parse_file_config(content: &str) -> Result<FileConfig, toml_edit::de::Error> {
    toml_edit::de::from_str(content)
}

/// Reads `path`, or `flowdesk.toml` in the working directory when no path
/// is given. Only the implicit file may be absent.
pub fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !path.exists() {
                debug!("No {} in working directory", DEFAULT_CONFIG_FILE);
                return Ok(FileConfig::default());
            }
            path
        }
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config = parse_file_config(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

// ── Resolved settings ───────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Settings {
    pub connection: Connection,
    pub update_method: UpdateMethod,
    pub list_limit: u32,
    pub execution_limit: u32,
}

impl Settings {
    pub fn resolve(args: &ConnectionArgs, file: FileConfig) -> Self {
        let defaults = Connection::default();
        let section = file.connection;

        let connection = Connection {
            host: args.host.clone().or(section.host).unwrap_or(defaults.host),
            port: args.port.or(section.port),
            base_path: args
                .base_path
                .clone()
                .or(section.base_path)
                .unwrap_or(defaults.base_path),
            api_key: args.api_key.clone().or(section.api_key).unwrap_or_default(),
            auth: args
                .auth
                .map(AuthScheme::from)
                .or(section.auth)
                .unwrap_or_default(),
            api_key_header: args
                .api_key_header
                .clone()
                .or(section.api_key_header)
                .unwrap_or(defaults.api_key_header),
        };

        Self {
            connection,
            update_method: args
                .update_method
                .map(UpdateMethod::from)
                .or(file.editor.update_method)
                .unwrap_or_default(),
            list_limit: file
                .editor
                .list_limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_LIST_LIMIT),
            execution_limit: file
                .editor
                .execution_limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_EXECUTION_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[connection]
host = "n8n.example.com"
port = 443
base_path = "/api/v1/"
api_key = "from-file"
auth = "bearer"

[editor]
update_method = "put"
list_limit = 25
"#;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::resolve(&ConnectionArgs::default(), FileConfig::default());
        assert_eq!(settings.connection, Connection::default());
        assert_eq!(
            settings.connection.base_url().expect("url"),
            "http://localhost:5678/api/v1"
        );
        assert_eq!(settings.update_method, UpdateMethod::Patch);
        assert_eq!(settings.list_limit, DEFAULT_LIST_LIMIT);
        assert_eq!(settings.execution_limit, DEFAULT_EXECUTION_LIMIT);
    }

    #[test]
    fn test_file_values_apply() {
        let file = parse_file_config(SAMPLE).expect("parse");
        let settings = Settings::resolve(&ConnectionArgs::default(), file);
        assert_eq!(settings.connection.host, "n8n.example.com");
        assert_eq!(settings.connection.port, Some(443));
        assert_eq!(settings.connection.api_key, "from-file");
        assert_eq!(settings.connection.auth, AuthScheme::Bearer);
        assert_eq!(settings.update_method, UpdateMethod::Put);
        assert_eq!(settings.list_limit, 25);
        assert_eq!(
            settings.connection.base_url().expect("url"),
            "https://n8n.example.com:443/api/v1"
        );
    }

    #[test]
    fn test_flags_win_over_file() {
        let file = parse_file_config(SAMPLE).expect("parse");
        let args = ConnectionArgs {
            host: Some("10.0.0.5".to_string()),
            port: Some(0),
            api_key: Some("from-flag".to_string()),
            auth: Some(AuthArg::ApiKey),
            update_method: Some(UpdateMethodArg::Patch),
            ..Default::default()
        };
        let settings = Settings::resolve(&args, file);
        assert_eq!(settings.connection.api_key, "from-flag");
        assert_eq!(settings.connection.auth, AuthScheme::ApiKey);
        assert_eq!(settings.connection.port, Some(0));
        assert_eq!(settings.update_method, UpdateMethod::Patch);
        assert_eq!(
            settings.connection.base_url().expect("url"),
            "http://10.0.0.5/api/v1"
        );
    }

    #[test]
    fn test_remote_host_without_port() {
        let args = ConnectionArgs {
            host: Some("n8n.example.com".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve(&args, FileConfig::default());
        assert_eq!(
            settings.connection.base_url().expect("url"),
            "https://n8n.example.com/api/v1"
        );
    }

    #[test]
    fn test_partial_file() {
        let file = parse_file_config("[editor]\nexecution_limit = 5\n").expect("parse");
        let settings = Settings::resolve(&ConnectionArgs::default(), file);
        assert_eq!(settings.execution_limit, 5);
        assert_eq!(settings.connection.host, "localhost");
    }

    #[test]
    fn test_invalid_file_is_error() {
        assert!(parse_file_config("[connection]\nauth = \"basic\"\n").is_err());
        assert!(parse_file_config("[connection]\nport = 70000\n").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        let config = load_file_config(Some(file.path())).expect("load");
        assert_eq!(config.connection.host.as_deref(), Some("n8n.example.com"));

        let missing = load_file_config(Some(Path::new("/nonexistent/flowdesk.toml")));
        assert!(missing.is_err());
    }
}
