//! Configuration file
//!
//! A single JSON object; every field has a default so `{}` is a valid
//! configuration. Loaded once by the CLI and handed to the subsystems.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::observability::Severity;
use crate::pipeline::PipelineConfig;
use crate::render::asciidoctor::{DEFAULT_COMMAND, DEFAULT_THEME};
use crate::upstream::{
    OpenAiSettings, UpstreamError, DEFAULT_API_BASE, DEFAULT_CHAT_MODEL, DEFAULT_MAX_TOKENS,
    DEFAULT_TRANSCRIPTION_MODEL,
};

/// Environment variable consulted when `openai.api_key` is unset
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding base documents
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Directory holding revisions
    #[serde(default = "default_variant_dir")]
    pub variant_dir: PathBuf,

    /// Document file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub renderer: RendererConfig,

    /// Minimum log severity (trace, info, warn, error, fatal)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    /// Falls back to `OPENAI_API_KEY` when absent
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Completion budget for one revision
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Deadline for a whole transform step; unset leaves only the HTTP timeout
    #[serde(default)]
    pub transform_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_renderer_command")]
    pub command: String,

    #[serde(default = "default_renderer_theme")]
    pub theme: String,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("adocs")
}
fn default_variant_dir() -> PathBuf {
    PathBuf::from("work")
}
fn default_extension() -> String {
    "adoc".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}
fn default_transcription_model() -> String {
    DEFAULT_TRANSCRIPTION_MODEL.to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_renderer_command() -> String {
    DEFAULT_COMMAND.to_string()
}
fn default_renderer_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            variant_dir: default_variant_dir(),
            extension: default_extension(),
            http: HttpServerConfig::default(),
            openai: OpenAiConfig::default(),
            renderer: RendererConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            chat_model: default_chat_model(),
            transcription_model: default_transcription_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            transform_timeout_secs: None,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: default_renderer_command(),
            theme: default_renderer_theme(),
        }
    }
}

impl Config {
    /// Load and validate configuration from `path`
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.extension.is_empty() || self.extension.contains('.') {
            return Err(ConfigError::Invalid(format!(
                "extension must be non-empty and contain no '.': '{}'",
                self.extension
            )));
        }
        if self.base_dir == self.variant_dir {
            return Err(ConfigError::Invalid(
                "base_dir and variant_dir must differ".to_string(),
            ));
        }
        if self.openai.timeout_secs == 0 {
            return Err(ConfigError::Invalid("openai.timeout_secs must be > 0".to_string()));
        }
        if self.openai.max_tokens == 0 {
            return Err(ConfigError::Invalid("openai.max_tokens must be > 0".to_string()));
        }
        if self.openai.transform_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "openai.transform_timeout_secs must be > 0 when set".to_string(),
            ));
        }
        if self.renderer.command.trim().is_empty() {
            return Err(ConfigError::Invalid("renderer.command must be set".to_string()));
        }
        self.severity()?;
        Ok(())
    }

    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log_level '{}'", self.log_level)))
    }

    /// Resolve upstream settings. `env_key` is only used when the file leaves
    /// `openai.api_key` unset.
    pub fn openai_settings(&self, env_key: Option<String>) -> Result<OpenAiSettings, UpstreamError> {
        let key = self
            .openai
            .api_key
            .clone()
            .or(env_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                UpstreamError::MissingCredential(format!(
                    "set openai.api_key in the config file or {}",
                    API_KEY_ENV
                ))
            })?;

        Ok(OpenAiSettings::new(key)
            .with_api_base(self.openai.api_base.clone())
            .with_timeout(Duration::from_secs(self.openai.timeout_secs)))
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            transform_timeout: self.openai.transform_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.base_dir, PathBuf::from("adocs"));
        assert_eq!(config.variant_dir, PathBuf::from("work"));
        assert_eq!(config.extension, "adoc");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.openai.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.renderer.theme, "default-sans");
        assert_eq!(config.severity().unwrap(), Severity::Info);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_json(
            r#"{"http": {"port": 9000}, "openai": {"timeout_secs": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.openai.timeout_secs, 5);
        assert_eq!(config.openai.transcription_model, "whisper-1");
    }

    #[test]
    fn test_rejects_dotted_extension() {
        let err = Config::from_json(r#"{"extension": ".adoc"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_same_roots() {
        let err = Config::from_json(r#"{"base_dir": "x", "variant_dir": "x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_timeout_and_bad_level() {
        assert!(Config::from_json(r#"{"openai": {"timeout_secs": 0}}"#).is_err());
        assert!(Config::from_json(r#"{"log_level": "loud"}"#).is_err());
    }

    #[test]
    fn test_revision_limits() {
        let config = Config::default();
        assert_eq!(config.openai.max_tokens, 2048);
        assert!(config.pipeline_config().transform_timeout.is_none());

        let config = Config::from_json(
            r#"{"openai": {"max_tokens": 512, "transform_timeout_secs": 30}}"#,
        )
        .unwrap();
        assert_eq!(config.openai.max_tokens, 512);
        assert_eq!(
            config.pipeline_config().transform_timeout,
            Some(Duration::from_secs(30))
        );

        assert!(Config::from_json(r#"{"openai": {"max_tokens": 0}}"#).is_err());
        assert!(Config::from_json(r#"{"openai": {"transform_timeout_secs": 0}}"#).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("adocflow.json");
        fs::write(&path, r#"{"extension": "asciidoc"}"#).unwrap();
        assert_eq!(Config::load(&path).unwrap().extension, "asciidoc");
    }

    #[test]
    fn test_file_key_wins_over_env() {
        let config =
            Config::from_json(r#"{"openai": {"api_key": "from-file"}}"#).unwrap();
        let settings = config.openai_settings(Some("from-env".into())).unwrap();
        assert_eq!(settings.api_key, "from-file");
    }

    #[test]
    fn test_env_key_fallback_and_missing() {
        let config = Config::default();
        let settings = config.openai_settings(Some("from-env".into())).unwrap();
        assert_eq!(settings.api_key, "from-env");
        assert_eq!(settings.timeout, Duration::from_secs(120));

        assert!(matches!(
            config.openai_settings(None),
            Err(UpstreamError::MissingCredential(_))
        ));
        assert!(config.openai_settings(Some("  ".into())).is_err());
    }
}
