use std::path::PathBuf;

use guidesync_client::ClientError;
use guidesync_content::ContentError;
use serde::Serialize;
use thiserror::Error;

use crate::model::{Failure, RunReport};

/// Configuration could not be loaded or is incomplete.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(String),

    /// A required option was not provided by any layer.
    #[error("missing required option '{key}' (set {env} or '{key}' in the config file)")]
    Missing { key: &'static str, env: &'static str },

    /// An option was provided but its value is unusable.
    #[error("invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Documents sharing one identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub identity_key: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ReconError {
    /// Two or more local documents map to the same identity key. Raised before
    /// any remote call.
    #[error("duplicate identity keys in local content: {}", describe_groups(.groups))]
    DuplicateIdentity { groups: Vec<DuplicateGroup> },

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Remote(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run finished under the continue policy but some mutations failed.
    #[error("run incomplete: {} operation(s) failed", .failures.len())]
    Incomplete {
        failures: Vec<Failure>,
        report: RunReport,
    },
}

fn describe_groups(groups: &[DuplicateGroup]) -> String {
    groups
        .iter()
        .map(|g| format!("{} <- [{}]", g.identity_key, g.paths.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_identity_lists_every_path() {
        let err = ReconError::DuplicateIdentity {
            groups: vec![DuplicateGroup {
                identity_key: "abc".into(),
                paths: vec!["a.html".into(), "b.html".into()],
            }],
        };
        assert_eq!(
            err.to_string(),
            "duplicate identity keys in local content: abc <- [a.html, b.html]"
        );
    }

    #[test]
    fn missing_option_names_env_var() {
        let err = ConfigError::Missing {
            key: "type_id",
            env: "EXTERNAL_CONTENT_TYPE_ID",
        };
        let msg = err.to_string();
        assert!(msg.contains("type_id"), "{msg}");
        assert!(msg.contains("EXTERNAL_CONTENT_TYPE_ID"), "{msg}");
    }
}
