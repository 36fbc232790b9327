use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use guidesync_client::{ClientOptions, Credential};
use guidesync_content::LoadOptions;
use serde::Deserialize;
use url::Url;

use crate::engine::ReconOptions;
use crate::error::ConfigError;

pub const DEFAULT_CONTENT_ELEMENT: &str = "body";
pub const DEFAULT_LOCALE: &str = "en-us";
pub const DEFAULT_MAX_BODY_LEN: usize = 9000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Failure policy
// ---------------------------------------------------------------------------

/// What to do when a single create, update or delete fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure. No deletes run after it.
    #[default]
    Abort,
    /// Record the failure and carry on, deletes included.
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(format!("expected 'abort' or 'continue', got '{other}'")),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

// ---------------------------------------------------------------------------
// Partial inputs (one per layer)
// ---------------------------------------------------------------------------

/// One configuration layer. Every field is optional; layers are merged and
/// then resolved into a [`SyncConfig`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigInputs {
    pub api_base_url: Option<String>,
    pub credential: Option<String>,
    pub type_id: Option<String>,
    pub source_id: Option<String>,
    pub content_dir: Option<PathBuf>,
    pub target_base_url: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub content_element: Option<String>,
    pub locale: Option<String>,
    pub max_body_len: Option<usize>,
    pub on_error: Option<FailurePolicy>,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
}

impl ConfigInputs {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: ConfigInputs) -> ConfigInputs {
        ConfigInputs {
            api_base_url: other.api_base_url.or(self.api_base_url),
            credential: other.credential.or(self.credential),
            type_id: other.type_id.or(self.type_id),
            source_id: other.source_id.or(self.source_id),
            content_dir: other.content_dir.or(self.content_dir),
            target_base_url: other.target_base_url.or(self.target_base_url),
            working_dir: other.working_dir.or(self.working_dir),
            content_element: other.content_element.or(self.content_element),
            locale: other.locale.or(self.locale),
            max_body_len: other.max_body_len.or(self.max_body_len),
            on_error: other.on_error.or(self.on_error),
            page_size: other.page_size.or(self.page_size),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Settings for loading the local corpus only. Remote options may be absent.
    pub fn resolve_content(&self) -> Result<ContentSettings, ConfigError> {
        let source_id = non_empty(self.source_id.clone(), "source_id", "EXTERNAL_CONTENT_SOURCE_ID")?;
        let content_element = self
            .content_element
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_ELEMENT.to_string());
        if content_element.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "content_element",
                reason: "must not be empty".into(),
            });
        }

        Ok(ContentSettings {
            content_dir: self.content_dir()?,
            load: LoadOptions::new(source_id, self.target_base_url()?).with_selector(content_element),
        })
    }

    /// Settings for talking to the record store only.
    pub fn resolve_remote(&self) -> Result<RemoteSettings, ConfigError> {
        let api_base_url = required(self.api_base_url.clone(), "api_base_url", "ZENDESK_BASE_URL")?;
        validate_api_base_url(&api_base_url)?;
        let credential = non_empty(self.credential.clone(), "credential", "ZENDESK_AUTH")?;
        let type_id = non_empty(self.type_id.clone(), "type_id", "EXTERNAL_CONTENT_TYPE_ID")?;

        let timeout = Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        if timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                reason: "must be greater than 0".into(),
            });
        }
        if self.page_size == Some(0) {
            return Err(ConfigError::Invalid {
                key: "page_size",
                reason: "must be greater than 0".into(),
            });
        }

        Ok(RemoteSettings {
            client: ClientOptions::new(api_base_url, Credential::from_encoded(credential))
                .with_timeout(timeout)
                .with_page_size(self.page_size),
            type_id,
        })
    }

    /// Fill defaults, check required options and validate.
    pub fn resolve(self) -> Result<SyncConfig, ConfigError> {
        let content_dir = self.content_dir()?;
        let target_base_url = self.target_base_url()?;

        let config = SyncConfig {
            api_base_url: required(self.api_base_url, "api_base_url", "ZENDESK_BASE_URL")?,
            credential: Credential::from_encoded(required(self.credential, "credential", "ZENDESK_AUTH")?),
            type_id: required(self.type_id, "type_id", "EXTERNAL_CONTENT_TYPE_ID")?,
            source_id: required(self.source_id, "source_id", "EXTERNAL_CONTENT_SOURCE_ID")?,
            content_dir,
            target_base_url,
            content_element: self
                .content_element
                .unwrap_or_else(|| DEFAULT_CONTENT_ELEMENT.to_string()),
            locale: self.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            max_body_len: self.max_body_len.unwrap_or(DEFAULT_MAX_BODY_LEN),
            on_error: self.on_error.unwrap_or_default(),
            page_size: self.page_size,
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        };
        config.validate()?;
        Ok(config)
    }

    /// `content_dir`, joined onto `working_dir` when relative.
    fn content_dir(&self) -> Result<PathBuf, ConfigError> {
        let content_dir = required(self.content_dir.clone(), "content_dir", "CONTENT_DIR")?;
        Ok(match &self.working_dir {
            Some(base) if content_dir.is_relative() => base.join(content_dir),
            _ => content_dir,
        })
    }

    fn target_base_url(&self) -> Result<Url, ConfigError> {
        let raw = required(self.target_base_url.as_deref(), "target_base_url", "TARGET_BASE_URL")?;
        let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
            key: "target_base_url",
            reason: format!("'{raw}': {e}"),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                key: "target_base_url",
                reason: format!("'{raw}' cannot be used as a base URL"),
            });
        }
        Ok(url)
    }
}

/// What `scan` needs: where the corpus lives and how to identify documents.
#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub content_dir: PathBuf,
    pub load: LoadOptions,
}

/// What `list` needs: how to reach the store and which type is managed.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub client: ClientOptions,
    pub type_id: String,
}

fn non_empty(value: Option<String>, key: &'static str, env: &'static str) -> Result<String, ConfigError> {
    let value = required(value, key, env)?;
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must not be empty".into(),
        });
    }
    Ok(value)
}

fn validate_api_base_url(api: &str) -> Result<(), ConfigError> {
    let api = api.trim();
    if !(api.starts_with("http://") || api.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            key: "api_base_url",
            reason: format!("must start with http:// or https://, got '{api}'"),
        });
    }
    if Url::parse(api).is_err() {
        return Err(ConfigError::Invalid {
            key: "api_base_url",
            reason: format!("'{api}' is not a valid URL"),
        });
    }
    Ok(())
}

fn required<T>(value: Option<T>, key: &'static str, env: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing { key, env })
}

// ---------------------------------------------------------------------------
// Resolved config
// ---------------------------------------------------------------------------

/// Fully resolved settings for one run. Built once at startup.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub api_base_url: String,
    pub credential: Credential,
    pub type_id: String,
    pub source_id: String,
    pub content_dir: PathBuf,
    pub target_base_url: Url,
    pub content_element: String,
    pub locale: String,
    pub max_body_len: usize,
    pub on_error: FailurePolicy,
    pub page_size: Option<u32>,
    pub timeout: Duration,
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api_base_url(&self.api_base_url)?;

        if self.target_base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                key: "target_base_url",
                reason: format!("'{}' cannot be used as a base URL", self.target_base_url),
            });
        }

        if self.credential.is_empty() {
            return Err(ConfigError::Invalid {
                key: "credential",
                reason: "must not be empty".into(),
            });
        }

        for (key, value) in [
            ("type_id", &self.type_id),
            ("source_id", &self.source_id),
            ("content_element", &self.content_element),
            ("locale", &self.locale),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must not be empty".into(),
                });
            }
        }

        if self.max_body_len == 0 {
            return Err(ConfigError::Invalid {
                key: "max_body_len",
                reason: "must be greater than 0".into(),
            });
        }
        if self.page_size == Some(0) {
            return Err(ConfigError::Invalid {
                key: "page_size",
                reason: "must be greater than 0".into(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::new(self.source_id.clone(), self.target_base_url.clone())
            .with_selector(self.content_element.clone())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::new(self.api_base_url.clone(), self.credential.clone())
            .with_timeout(self.timeout)
            .with_page_size(self.page_size)
    }

    pub fn recon_options(&self) -> ReconOptions {
        ReconOptions {
            type_id: self.type_id.clone(),
            source_id: self.source_id.clone(),
            locale: self.locale.clone(),
            max_body_len: self.max_body_len,
            on_error: self.on_error,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
