//! Service configuration
//!
//! Loaded once at startup and handed to each component. Sources, lowest
//! precedence first:
//! - Built-in defaults
//! - Optional TOML file
//! - `CODESHOT_` prefixed environment variables (`__` separates sections)
//! - Conventional AWS / OpenAI variables

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Environment prefix for service settings
pub const ENV_PREFIX: &str = "CODESHOT_";

/// Preset passed to the code renderer when none is configured
pub const DEFAULT_CODE_PRESET: &str = "latest-preset";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub renderer: RendererConfig,
    pub storage: StorageConfig,
    pub agent: AgentConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Deadline for a whole request, renders included
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            request_timeout_secs: 120,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// External renderer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Code screenshot tool
    pub code_tool: PathBuf,
    /// Preset used when a request names none
    pub code_preset: Option<String>,
    /// Local style configuration passed via `--config`
    pub code_style_config: Option<PathBuf>,
    /// Diagram rendering tool
    pub diagram_tool: PathBuf,
    /// Where workspaces are created; system temp dir when unset
    pub scratch_dir: Option<PathBuf>,
    /// Upper bound on a single tool run
    pub timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            code_tool: PathBuf::from("carbon-now"),
            code_preset: None,
            code_style_config: None,
            diagram_tool: PathBuf::from("mmdc"),
            scratch_dir: None,
            timeout_secs: 60,
        }
    }
}

impl RendererConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the preset for a request: explicit, configured, then built-in
    pub fn resolve_preset<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        let non_blank = |p: &&str| !p.trim().is_empty();
        requested
            .filter(non_blank)
            .or(self.code_preset.as_deref().filter(non_blank))
            .unwrap_or(DEFAULT_CODE_PRESET)
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Which artifact store backs generated images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    S3,
}

impl StorageBackend {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<StorageBackend> {
        match s.to_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Some(StorageBackend::Local),
            "s3" | "remote" => Some(StorageBackend::S3),
            _ => None,
        }
    }
}

/// Artifact storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory served at `url_prefix` (local backend)
    pub public_dir: PathBuf,
    /// Root-relative path prefix of local references
    pub url_prefix: String,
    pub s3: S3Config,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            public_dir: PathBuf::from("public/generated-images"),
            url_prefix: "/generated-images".to_string(),
            s3: S3Config::default(),
        }
    }
}

/// Object storage settings (S3 backend)
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Public host that fronts the bucket, e.g. `d1234.cloudfront.net`
    pub cdn_domain: Option<String>,
    /// S3-compatible endpoint; path-style addressing is used when set
    pub endpoint: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            bucket: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            cdn_domain: None,
            endpoint: None,
        }
    }
}

// Keep the secret out of logs
impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("cdn_domain", &self.cdn_domain)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Hosted model settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// OpenAI-compatible API base URL
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    /// Upper bound on snippets rendered per message
    pub max_snippets: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            max_snippets: 4,
        }
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_snippets", &self.max_snippets)
            .finish()
    }
}

impl Config {
    /// Build the figment for a config file path (missing file is ignored)
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(conventional_env())
    }

    /// Load configuration from defaults, file and environment
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }
}

/// Map well-known variable names onto config keys
fn conventional_env() -> Env {
    Env::raw()
        .only(&[
            "AWS_REGION",
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "S3_BUCKET_NAME",
            "CDN_DOMAIN",
            "OPENAI_API_KEY",
        ])
        .map(|key| match key.as_str().to_ascii_lowercase().as_str() {
            "aws_region" => "storage.s3.region".into(),
            "aws_access_key_id" => "storage.s3.access_key_id".into(),
            "aws_secret_access_key" => "storage.s3.secret_access_key".into(),
            "s3_bucket_name" => "storage.s3.bucket".into(),
            "cdn_domain" => "storage.s3.cdn_domain".into(),
            "openai_api_key" => "agent.api_key".into(),
            other => other.to_string().into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr.port(), 8080);
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.storage.url_prefix, "/generated-images");
        assert_eq!(config.renderer.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_resolve_preset() {
        let mut renderer = RendererConfig::default();
        assert_eq!(renderer.resolve_preset(None), DEFAULT_CODE_PRESET);
        assert_eq!(renderer.resolve_preset(Some("")), DEFAULT_CODE_PRESET);

        renderer.code_preset = Some("dracula".to_string());
        assert_eq!(renderer.resolve_preset(None), "dracula");
        assert_eq!(renderer.resolve_preset(Some("nord")), "nord");
    }

    #[test]
    fn test_resolve_preset_ignores_blank_configured_preset() {
        let renderer = RendererConfig {
            code_preset: Some("  ".to_string()),
            ..RendererConfig::default()
        };
        assert_eq!(renderer.resolve_preset(None), DEFAULT_CODE_PRESET);
        assert_eq!(renderer.resolve_preset(Some("")), DEFAULT_CODE_PRESET);
        assert_eq!(renderer.resolve_preset(Some("nord")), "nord");
    }

    #[test]
    fn test_load_blank_preset_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("CODESHOT_RENDERER__CODE_PRESET", "");
            let config = Config::load(None).expect("config loads");
            assert_eq!(config.renderer.resolve_preset(None), DEFAULT_CODE_PRESET);
            Ok(())
        });
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!(StorageBackend::from_str("local"), Some(StorageBackend::Local));
        assert_eq!(StorageBackend::from_str("S3"), Some(StorageBackend::S3));
        assert_eq!(StorageBackend::from_str("ftp"), None);
    }

    #[test]
    fn test_load_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "codeshot.toml",
                r#"
                [server]
                bind_addr = "0.0.0.0:3000"

                [renderer]
                code_tool = "/opt/bin/carbon-now"
                timeout_secs = 5

                [storage]
                backend = "s3"
                "#,
            )?;
            jail.set_env("CODESHOT_STORAGE__S3__BUCKET", "from-prefixed");
            jail.set_env("CDN_DOMAIN", "cdn.example.com");
            jail.set_env("AWS_REGION", "eu-west-1");

            let config = Config::load(Some(Path::new("codeshot.toml")))?;
            assert_eq!(config.server.bind_addr.port(), 3000);
            assert_eq!(config.renderer.code_tool, PathBuf::from("/opt/bin/carbon-now"));
            assert_eq!(config.renderer.timeout_secs, 5);
            assert_eq!(config.storage.backend, StorageBackend::S3);
            assert_eq!(config.storage.s3.bucket, "from-prefixed");
            assert_eq!(config.storage.s3.region, "eu-west-1");
            assert_eq!(
                config.storage.s3.cdn_domain.as_deref(),
                Some("cdn.example.com")
            );
            Ok(())
        });
    }

    #[test]
    fn test_conventional_bucket_overrides_prefixed() {
        Jail::expect_with(|jail| {
            jail.set_env("CODESHOT_STORAGE__S3__BUCKET", "prefixed");
            jail.set_env("S3_BUCKET_NAME", "conventional");
            let config = Config::load(None)?;
            assert_eq!(config.storage.s3.bucket, "conventional");
            Ok(())
        });
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::default();
        config.storage.s3.secret_access_key = "hunter2".to_string();
        config.agent.api_key = Some("sk-secret".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("sk-secret"));
    }
}
