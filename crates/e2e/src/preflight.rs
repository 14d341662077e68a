//! Reachability check of the calculator page before the matrix starts
//!
//! An unreachable page would otherwise show up as one driver error per case
//! per build.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    pub enabled: bool,

    /// Requests made before giving up
    pub attempts: usize,

    pub request_timeout_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            attempts: 5,
            request_timeout_ms: 5000,
            retry_delay_ms: 500,
        }
    }
}

/// Wait for the page to answer with a success status.
///
/// Non-HTTP URLs (e.g. `file://` builds) are not checked.
pub async fn check_reachable(url: &str, config: &PreflightConfig) -> E2eResult<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        info!("Skipping preflight for non-HTTP page {}", url);
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()?;

    let attempts = config.attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Calculator page reachable at {}", url);
                return Ok(());
            }
            Ok(resp) => {
                last_error = format!("HTTP {}", resp.status());
                warn!("Preflight returned {}", resp.status());
            }
            Err(e) => {
                if attempt == 1 {
                    info!("Waiting for calculator page at {}...", url);
                }
                // Connection refused is expected while a local server starts
                if !e.is_connect() {
                    warn!("Preflight error: {}", e);
                }
                last_error = e.to_string();
            }
        }

        if attempt < attempts {
            sleep(Duration::from_millis(config.retry_delay_ms)).await;
        }
    }

    Err(E2eError::Preflight {
        attempts,
        reason: last_error,
    })
}
