//! Execution options shared by single, batched and file requests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable overriding the default CA bundle location.
pub const CA_BUNDLE_ENV: &str = "REQUESTER_CA_BUNDLE";

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 300_000;

const PACKAGED_CA_BUNDLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/certificates/cacert.pem");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteOptions {
    /// 0 disables redirect following.
    pub max_redirects: u32,
    pub connect_timeout_ms: u64,
    /// CA bundle applied to `https` requests that have no explicit SSL block.
    pub ca_bundle: Option<PathBuf>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            max_redirects: 0,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            ca_bundle: None,
        }
    }
}

impl ExecuteOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// CA bundle to use when none was configured on the request: the explicit
    /// override, then `REQUESTER_CA_BUNDLE`, then a `certificates/cacert.pem`
    /// shipped next to the crate.
    ///
    /// `None` leaves verification to the engine's built-in CA store. A
    /// configured path is returned even if it does not exist, so the caller
    /// can report it.
    pub fn default_ca_bundle(&self) -> Option<PathBuf> {
        let configured = self.ca_bundle.clone().or_else(|| {
            std::env::var_os(CA_BUNDLE_ENV)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
        });
        resolve_ca_bundle(configured, Path::new(PACKAGED_CA_BUNDLE))
    }
}

fn resolve_ca_bundle(configured: Option<PathBuf>, packaged: &Path) -> Option<PathBuf> {
    configured.or_else(|| packaged.is_file().then(|| packaged.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ExecuteOptions::default();
        assert_eq!(options.max_redirects, 0);
        assert_eq!(options.connect_timeout(), Duration::from_secs(300));
        assert!(options.ca_bundle.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let options = ExecuteOptions::from_json(r#"{"max_redirects": 5}"#).unwrap();
        assert_eq!(options.max_redirects, 5);
        assert_eq!(options.connect_timeout_ms, 300_000);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ExecuteOptions::from_json(r#"{"max_redirects": "many"}"#).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn explicit_ca_bundle_wins() {
        let options = ExecuteOptions {
            ca_bundle: Some(PathBuf::from("/tmp/ca.pem")),
            ..Default::default()
        };
        assert_eq!(options.default_ca_bundle(), Some(PathBuf::from("/tmp/ca.pem")));
    }

    #[test]
    fn missing_packaged_bundle_falls_back_to_engine_store() {
        let packaged = Path::new("/no/such/cacert.pem");
        assert_eq!(resolve_ca_bundle(None, packaged), None);

        let shipped = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            resolve_ca_bundle(None, shipped.path()),
            Some(shipped.path().to_path_buf())
        );
        assert_eq!(
            resolve_ca_bundle(Some(PathBuf::from("/tmp/ca.pem")), shipped.path()),
            Some(PathBuf::from("/tmp/ca.pem"))
        );
    }
}
