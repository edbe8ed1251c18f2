//! CLI configuration file.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [[contexts]]
//! kind = "rsa"
//! identity = "server"
//! mode = "encrypt-decrypt-oaep"
//! public_key = "keys/server.spki.der"
//! private_key = "keys/server.pkcs8.der"
//!
//! [[contexts]]
//! kind = "symmetric"
//! identity = "psk-device"
//! encryption_key = "keys/device.enc"
//! hmac_key = "keys/device.hmac"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use serde::{Deserialize, Serialize};
use tessera_crypto::CryptoContextMode;

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Configured crypto contexts, looked up by identity.
    #[serde(default)]
    pub contexts: Vec<ContextConfig>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for `tessera*` targets: "trace" | "debug" | "info" | "warn" | "error".
    /// `RUST_LOG` directives are applied on top.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// One crypto context. Key paths point at DER files (RSA) or raw key bytes
/// (symmetric). A missing key disables the operations that need it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContextConfig {
    Rsa {
        identity: String,
        mode: CryptoContextMode,
        /// DER `SubjectPublicKeyInfo`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_key: Option<PathBuf>,
        /// DER PKCS#8.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        private_key: Option<PathBuf>,
    },
    Symmetric {
        identity: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encryption_key: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hmac_key: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wrap_key: Option<PathBuf>,
    },
}

impl ContextConfig {
    /// Identity the context is addressed by.
    pub fn identity(&self) -> &str {
        match self {
            Self::Rsa { identity, .. } | Self::Symmetric { identity, .. } => identity,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl CliConfig {
    /// Load configuration from `path`.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Self::parse(&content).with_context(|| format!("in config {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: CliConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Identities must be non-empty and unique.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for context in &self.contexts {
            let identity = context.identity();
            if identity.is_empty() {
                bail!("context identity must not be empty");
            }
            if !seen.insert(identity) {
                bail!("duplicate context identity {identity:?}");
            }
        }
        Ok(())
    }

    /// Look up a context by identity.
    pub fn context(&self, identity: &str) -> Option<&ContextConfig> {
        self.contexts.iter().find(|c| c.identity() == identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [logging]
        level = "debug"

        [[contexts]]
        kind = "rsa"
        identity = "server"
        mode = "sign-verify"
        public_key = "server.spki.der"

        [[contexts]]
        kind = "symmetric"
        identity = "psk-device"
        encryption_key = "device.enc"
    "#;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.contexts.is_empty());
    }

    #[test]
    fn test_parse_sample() {
        let config = CliConfig::parse(SAMPLE).expect("parse");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.contexts.len(), 2);

        let server = config.context("server").expect("server");
        assert!(matches!(
            server,
            ContextConfig::Rsa {
                mode: CryptoContextMode::SignVerify,
                private_key: None,
                ..
            }
        ));
        if let ContextConfig::Rsa { public_key, .. } = server {
            assert_eq!(public_key.as_deref(), Some(Path::new("server.spki.der")));
        }
        assert!(matches!(
            config.context("psk-device"),
            Some(ContextConfig::Symmetric { hmac_key: None, .. })
        ));
        assert!(config.context("nobody").is_none());
    }

    #[test]
    fn test_missing_sections_default() {
        let config = CliConfig::parse("").expect("empty");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        let dup = r#"
            [[contexts]]
            kind = "symmetric"
            identity = "a"
            [[contexts]]
            kind = "symmetric"
            identity = "a"
        "#;
        assert!(CliConfig::parse(dup).is_err());

        let empty = r#"
            [[contexts]]
            kind = "symmetric"
            identity = ""
        "#;
        assert!(CliConfig::parse(empty).is_err());
    }

    #[test]
    fn test_rejects_unknown_mode_and_kind() {
        let bad_mode = r#"
            [[contexts]]
            kind = "rsa"
            identity = "a"
            mode = "encrypt-everything"
        "#;
        assert!(CliConfig::parse(bad_mode).is_err());

        let bad_kind = r#"
            [[contexts]]
            kind = "ecdsa"
            identity = "a"
        "#;
        assert!(CliConfig::parse(bad_kind).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = CliConfig::parse(SAMPLE).expect("parse");
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed = CliConfig::parse(&toml_str).expect("reparse");
        assert_eq!(parsed.contexts.len(), 2);
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let config = CliConfig::load(Path::new("/nonexistent/tessera.toml")).expect("defaults");
        assert!(config.contexts.is_empty());
    }
}
