//! Service configuration
//!
//! Settings are read from environment variables, falling back to defaults
//! suitable for local development. Production deployments must supply the
//! secrets listed in [`Settings::validate`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{ServiceError, ServiceResult};

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Production,
}

/// Identity bound to an API token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenIdentity {
    pub user_id: String,
    pub email: Option<String>,
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Root data directory
    pub data_dir: PathBuf,
    /// Base URL used when building public links to uploads and exports
    pub public_base_url: String,
    /// Maximum accepted upload size in bytes
    pub max_file_size: u64,
    /// Accepted audio file extensions (lower case)
    pub allowed_audio_formats: Vec<String>,
    /// Accepted video file extensions (lower case)
    pub allowed_video_formats: Vec<String>,
}

/// State snapshot settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// Enable periodic state snapshots
    pub enabled: bool,
    /// Snapshot interval in seconds
    pub interval_secs: u64,
}

/// Cache sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    pub capacity: usize,
    pub default_ttl_secs: u64,
}

/// AI provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSettings {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
}

/// Workflow execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Maximum number of workflows executing at once
    pub max_concurrent: usize,
    /// Transcription step timeout in seconds
    pub transcription_timeout_secs: u64,
    /// Draft generation step timeout in seconds
    pub generation_timeout_secs: u64,
    /// Retries per step after the first attempt
    pub max_retries: u32,
}

/// CMS integration credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CmsSettings {
    pub wordpress_url: Option<String>,
    pub wordpress_username: Option<String>,
    pub wordpress_password: Option<String>,
    pub ghost_url: Option<String>,
    pub ghost_api_key: Option<String>,
    pub medium_token: Option<String>,
}

/// Complete service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app_name: String,
    pub version: String,
    pub environment: Environment,
    pub debug: bool,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    /// Bearer token to identity map
    #[serde(skip_serializing)]
    pub api_tokens: HashMap<String, TokenIdentity>,
    pub allowed_origins: Vec<String>,
    pub storage: StorageSettings,
    pub persistence: PersistenceSettings,
    pub cache: CacheSettings,
    #[serde(skip_serializing)]
    pub ai: AiSettings,
    pub workflow: WorkflowSettings,
    #[serde(skip_serializing)]
    pub cms: CmsSettings,
    pub enable_metrics: bool,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "EchoPress AI".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            debug: false,
            host: "0.0.0.0".to_string(),
            port: 8000,
            secret_key: None,
            api_tokens: HashMap::new(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
            storage: StorageSettings {
                data_dir: PathBuf::from("./data"),
                public_base_url: "http://localhost:8000".to_string(),
                max_file_size: 500 * 1024 * 1024,
                allowed_audio_formats: ["mp3", "wav", "m4a", "ogg", "flac"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                allowed_video_formats: ["mp4", "avi", "mov", "mkv"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            persistence: PersistenceSettings {
                enabled: true,
                interval_secs: 300,
            },
            cache: CacheSettings {
                capacity: 1024,
                default_ttl_secs: 300,
            },
            ai: AiSettings {
                openai_api_key: None,
                openai_model: "gpt-4-turbo-preview".to_string(),
                openai_base_url: "https://api.openai.com/v1".to_string(),
            },
            workflow: WorkflowSettings {
                max_concurrent: 10,
                transcription_timeout_secs: 3600,
                generation_timeout_secs: 1800,
                max_retries: 2,
            },
            cms: CmsSettings::default(),
            enable_metrics: true,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> ServiceResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ServiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let environment = match get("ENVIRONMENT").as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ServiceError::ValidationError(format!(
                    "ENVIRONMENT must be 'development' or 'production', got '{}'",
                    other
                )))
            }
        };

        let data_dir = get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.storage.data_dir);
        let port: u16 = parse_or(&get, "PORT", defaults.port)?;
        let host = get("HOST").unwrap_or(defaults.host);

        let settings = Settings {
            app_name: get("APP_NAME").unwrap_or(defaults.app_name),
            version: defaults.version,
            environment,
            debug: parse_bool_or(&get, "DEBUG", defaults.debug)?,
            host,
            port,
            secret_key: get("SECRET_KEY"),
            api_tokens: match get("API_TOKENS") {
                Some(raw) => parse_api_tokens(&raw)?,
                None => HashMap::new(),
            },
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|raw| parse_list(&raw, false))
                .unwrap_or(defaults.allowed_origins),
            storage: StorageSettings {
                data_dir,
                public_base_url: get("PUBLIC_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| format!("http://localhost:{}", port)),
                max_file_size: parse_or(&get, "MAX_FILE_SIZE", defaults.storage.max_file_size)?,
                allowed_audio_formats: get("ALLOWED_AUDIO_FORMATS")
                    .map(|raw| parse_list(&raw, true))
                    .unwrap_or(defaults.storage.allowed_audio_formats),
                allowed_video_formats: get("ALLOWED_VIDEO_FORMATS")
                    .map(|raw| parse_list(&raw, true))
                    .unwrap_or(defaults.storage.allowed_video_formats),
            },
            persistence: PersistenceSettings {
                enabled: parse_bool_or(&get, "PERSISTENCE_ENABLED", defaults.persistence.enabled)?,
                interval_secs: parse_or(&get, "PERSISTENCE_INTERVAL_SECS", defaults.persistence.interval_secs)?,
            },
            cache: CacheSettings {
                capacity: parse_or(&get, "CACHE_CAPACITY", defaults.cache.capacity)?,
                default_ttl_secs: parse_or(&get, "CACHE_TTL_SECS", defaults.cache.default_ttl_secs)?,
            },
            ai: AiSettings {
                openai_api_key: get("OPENAI_API_KEY"),
                openai_model: get("OPENAI_MODEL").unwrap_or(defaults.ai.openai_model),
                openai_base_url: get("OPENAI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.ai.openai_base_url),
            },
            workflow: WorkflowSettings {
                max_concurrent: parse_or(&get, "MAX_CONCURRENT_WORKFLOWS", defaults.workflow.max_concurrent)?,
                transcription_timeout_secs: parse_or(
                    &get,
                    "TRANSCRIPTION_TIMEOUT",
                    defaults.workflow.transcription_timeout_secs,
                )?,
                generation_timeout_secs: parse_or(
                    &get,
                    "DRAFT_GENERATION_TIMEOUT",
                    defaults.workflow.generation_timeout_secs,
                )?,
                max_retries: parse_or(&get, "WORKFLOW_MAX_RETRIES", defaults.workflow.max_retries)?,
            },
            cms: CmsSettings {
                wordpress_url: get("CMS_WORDPRESS_URL").map(|url| url.trim_end_matches('/').to_string()),
                wordpress_username: get("CMS_WORDPRESS_USERNAME"),
                wordpress_password: get("CMS_WORDPRESS_PASSWORD"),
                ghost_url: get("CMS_GHOST_URL"),
                ghost_api_key: get("CMS_GHOST_API_KEY"),
                medium_token: get("CMS_MEDIUM_TOKEN"),
            },
            enable_metrics: parse_bool_or(&get, "ENABLE_METRICS", defaults.enable_metrics)?,
            log_level: get("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or(defaults.log_level),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints and production secrets
    pub fn validate(&self) -> ServiceResult<()> {
        if self.workflow.max_concurrent == 0 {
            return Err(ServiceError::ValidationError(
                "MAX_CONCURRENT_WORKFLOWS must be at least 1".to_string(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(ServiceError::ValidationError("CACHE_CAPACITY must be at least 1".to_string()));
        }

        if self.environment == Environment::Production {
            let mut missing = Vec::new();
            if self.secret_key.is_none() {
                missing.push("SECRET_KEY");
            }
            if self.api_tokens.is_empty() {
                missing.push("API_TOKENS");
            }
            if self.ai.openai_api_key.is_none() {
                missing.push("OPENAI_API_KEY");
            }
            if !missing.is_empty() {
                return Err(ServiceError::ValidationError(format!(
                    "Missing required settings in production: {}",
                    missing.join(", ")
                )));
            }
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.storage.data_dir.join("uploads")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.storage.data_dir.join("exports")
    }

    pub fn state_path(&self) -> PathBuf {
        self.storage.data_dir.join("state.json")
    }

    /// Whether a file extension is an accepted upload format
    pub fn is_allowed_format(&self, extension: &str) -> bool {
        let ext = extension.to_lowercase();
        self.storage.allowed_audio_formats.contains(&ext)
            || self.storage.allowed_video_formats.contains(&ext)
            || CAPTION_FORMATS.contains(&ext.as_str())
    }
}

/// Caption formats accepted alongside audio so episodes can be transcribed from subtitles
pub const CAPTION_FORMATS: &[&str] = &["vtt", "srt", "txt"];

fn parse_or<T, G>(get: &G, key: &str, default: T) -> ServiceResult<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| {
            ServiceError::ValidationError(format!("{} has an invalid value: '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

fn parse_bool_or<G>(get: &G, key: &str, default: bool) -> ServiceResult<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_lowercase()) {
        Some(v) if ["1", "true", "yes", "on"].contains(&v.as_str()) => Ok(true),
        Some(v) if ["0", "false", "no", "off"].contains(&v.as_str()) => Ok(false),
        Some(v) => Err(ServiceError::ValidationError(format!(
            "{} must be a boolean, got '{}'",
            key, v
        ))),
        None => Ok(default),
    }
}

/// Split a comma-separated list, dropping empty items
pub fn parse_list(raw: &str, lowercase: bool) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| if lowercase { item.to_lowercase() } else { item.to_string() })
        .collect()
}

/// Parse `token:user_id[:email]` pairs
pub fn parse_api_tokens(raw: &str) -> ServiceResult<HashMap<String, TokenIdentity>> {
    let mut tokens = HashMap::new();
    for entry in parse_list(raw, false) {
        let mut parts = entry.splitn(3, ':');
        let token = parts.next().unwrap_or_default().trim();
        let user_id = parts.next().unwrap_or_default().trim();
        if token.is_empty() || user_id.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "API_TOKENS entry '{}' must look like token:user_id[:email]",
                entry
            )));
        }
        let email = parts.next().map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        tokens.insert(
            token.to_string(),
            TokenIdentity {
                user_id: user_id.to_string(),
                email,
            },
        );
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.environment, Environment::Development);
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.workflow.max_concurrent, 10);
        assert_eq!(settings.storage.max_file_size, 500 * 1024 * 1024);
        assert!(settings.is_allowed_format("MP3"));
        assert!(settings.is_allowed_format("vtt"));
        assert!(!settings.is_allowed_format("exe"));
    }

    #[test]
    fn test_lists_are_trimmed_and_lowercased() {
        let settings = Settings::from_lookup(lookup(&[
            ("ALLOWED_AUDIO_FORMATS", " MP3, Wav ,,"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
        ]))
        .unwrap();
        assert_eq!(settings.storage.allowed_audio_formats, vec!["mp3", "wav"]);
        assert_eq!(
            settings.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_invalid_number_names_key() {
        let err = Settings::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_production_requires_secrets() {
        let err = Settings::from_lookup(lookup(&[("ENVIRONMENT", "production")])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SECRET_KEY"));
        assert!(message.contains("API_TOKENS"));
        assert!(message.contains("OPENAI_API_KEY"));

        let ok = Settings::from_lookup(lookup(&[
            ("ENVIRONMENT", "production"),
            ("SECRET_KEY", "s3cret"),
            ("API_TOKENS", "tok:alice"),
            ("OPENAI_API_KEY", "sk-test"),
        ]));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_parse_api_tokens() {
        let tokens = parse_api_tokens("abc:user-1:alice@example.com, def:user-2").unwrap();
        assert_eq!(tokens["abc"].user_id, "user-1");
        assert_eq!(tokens["abc"].email.as_deref(), Some("alice@example.com"));
        assert_eq!(tokens["def"].email, None);
        assert!(parse_api_tokens("missing-user").is_err());
    }
}
