use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Address of the latest-version server proxied connections are
    /// forwarded to.
    #[serde(default = "default_upstream")]
    pub upstream: String,
    /// Protocol version expected from connecting clients.
    #[serde(default = "default_client_protocol")]
    pub client_protocol: i32,
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: u16,
    #[serde(default = "default_compression_enabled")]
    pub compression_enabled: bool,
    /// Pre-shared frame encryption key, 32 bytes hex-encoded. Frames stay
    /// in the clear when unset.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    19132
}

fn default_upstream() -> String {
    "127.0.0.1:19134".into()
}

fn default_client_protocol() -> i32 {
    419
}

fn default_compression_threshold() -> u16 {
    256
}

fn default_compression_enabled() -> bool {
    true
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            upstream: default_upstream(),
            client_protocol: default_client_protocol(),
            compression_threshold: default_compression_threshold(),
            compression_enabled: default_compression_enabled(),
            encryption_key: None,
        }
    }
}

impl ProxyConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ProxyConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Decode the configured frame encryption key, if any.
    pub fn key_bytes(&self) -> anyhow::Result<Option<[u8; 32]>> {
        let Some(hex) = &self.encryption_key else {
            return Ok(None);
        };
        if hex.len() != 64 {
            anyhow::bail!("encryption_key must be 64 hex characters");
        }
        let mut key = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)?;
            key[i] = u8::from_str_radix(pair, 16)?;
        }
        Ok(Some(key))
    }
}
