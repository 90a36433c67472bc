use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AssistError;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_SECRETS_PATH: &str = ".streamlit/secrets.toml";
const DEFAULT_TIMEOUT_SECONDS: f64 = 90.0;
const API_KEY_ENV_KEYS: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY"];

#[derive(Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Key/value pairs read from a TOML secrets file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretsFile {
    table: toml::Table,
}

impl SecretsFile {
    pub fn parse(raw: &str) -> Result<Self, AssistError> {
        let table = raw
            .parse::<toml::Table>()
            .map_err(|err| AssistError::Config(format!("secrets file is not valid TOML: {err}")))?;
        Ok(Self { table })
    }

    pub fn read(path: &Path) -> Result<Self, AssistError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            AssistError::Config(format!("failed reading {}: {err}", path.display()))
        })?;
        Self::parse(&raw)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.table
            .get(key)
            .and_then(toml::Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

impl Settings {
    /// Loads `.env` if present, then resolves settings from the process
    /// environment with the secrets file as the key fallback.
    pub fn load(secrets_path: Option<&Path>) -> Result<Self, AssistError> {
        let _ = dotenvy::dotenv();
        Self::load_with(non_empty_env, secrets_path)
    }

    /// The secrets file is only opened when no key is set in the environment.
    pub(crate) fn load_with<F>(lookup: F, secrets_path: Option<&Path>) -> Result<Self, AssistError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if env_api_key(&lookup).is_some() {
            return Self::resolve(lookup, None);
        }

        let explicit = secrets_path
            .map(Path::to_path_buf)
            .or_else(|| lookup("AUTOWISE_SECRETS").map(PathBuf::from));
        let secrets = match explicit {
            Some(path) => Some(SecretsFile::read(&path)?),
            None => {
                let default_path = Path::new(DEFAULT_SECRETS_PATH);
                if default_path.is_file() {
                    Some(SecretsFile::read(default_path)?)
                } else {
                    None
                }
            }
        };
        Self::resolve(lookup, secrets.as_ref())
    }

    pub fn resolve<F>(lookup: F, secrets: Option<&SecretsFile>) -> Result<Self, AssistError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = env_api_key(&lookup)
            .or_else(|| {
                secrets.and_then(|file| API_KEY_ENV_KEYS.iter().find_map(|key| file.get(key)))
            })
            .ok_or(AssistError::MissingApiKey)?;

        let api_base = lookup("GEMINI_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_s = match lookup("AUTOWISE_REQUEST_TIMEOUT") {
            Some(raw) => raw.parse::<f64>().map_err(|_| {
                AssistError::Config(format!(
                    "AUTOWISE_REQUEST_TIMEOUT must be a number of seconds, got '{raw}'"
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECONDS,
        };

        Ok(Self {
            api_key,
            api_base,
            model,
            request_timeout: Duration::from_secs_f64(clamp_timeout(timeout_s)),
        })
    }
}

fn env_api_key<F>(lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_ENV_KEYS.iter().find_map(|key| lookup(*key))
}

fn clamp_timeout(seconds: f64) -> f64 {
    if !seconds.is_finite() {
        return DEFAULT_TIMEOUT_SECONDS;
    }
    seconds.clamp(5.0, 300.0)
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
