//! Injected run configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{ClientOptions, DISCOVERY_ROOT};
use crate::error::{AuthReason, ReportError, Result};
use crate::locator::{PartialRef, Selection};
use crate::retry::Retry;

/// Everything a run needs to know about its environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub account_id: Option<String>,
    pub web_property_id: Option<String>,
    pub profile_id: Option<String>,
    pub key_file_path: Option<PathBuf>,
    pub service_account_identity: Option<String>,
    pub access_token: Option<String>,
    pub selection: Selection,
    pub discovery_root: String,
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_id: None,
            web_property_id: None,
            profile_id: None,
            key_file_path: None,
            service_account_identity: None,
            access_token: None,
            selection: Selection::default(),
            discovery_root: DISCOVERY_ROOT.to_string(),
            timeout: Duration::from_secs(30),
            retries: Retry::default().retries,
        }
    }
}

impl Config {
    /// The explicitly configured part of the target view.
    pub fn partial_ref(&self) -> PartialRef {
        PartialRef {
            account_id: self.account_id.clone(),
            web_property_id: self.web_property_id.clone(),
            profile_id: self.profile_id.clone(),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            discovery_root: self.discovery_root.clone(),
            timeout: self.timeout,
            retry: Retry {
                retries: self.retries,
                ..Default::default()
            },
        }
    }

    /// Service account key file, required when no access token is configured.
    pub fn key_file(&self) -> Result<&Path> {
        self.key_file_path.as_deref().ok_or_else(|| ReportError::Auth {
            reason: AuthReason::MissingKey,
            detail: "no key file configured (--key-file or GOOGLE_APPLICATION_CREDENTIALS)"
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ref_mirrors_options() {
        let config = Config {
            account_id: Some("296593".to_string()),
            profile_id: Some("107283129".to_string()),
            ..Default::default()
        };

        let partial = config.partial_ref();
        assert_eq!(partial.account_id.as_deref(), Some("296593"));
        assert_eq!(partial.web_property_id, None);
        assert_eq!(partial.profile_id.as_deref(), Some("107283129"));
    }

    #[test]
    fn test_client_options() {
        let config = Config {
            retries: 0,
            timeout: Duration::from_secs(5),
            ..Default::default()
        };

        let options = config.client_options();
        assert_eq!(options.retry.retries, 0);
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.discovery_root, DISCOVERY_ROOT);
    }

    #[test]
    fn test_missing_key_file() {
        let err = Config::default().key_file().unwrap_err();
        assert!(matches!(
            err,
            ReportError::Auth {
                reason: AuthReason::MissingKey,
                ..
            }
        ));
    }
}
