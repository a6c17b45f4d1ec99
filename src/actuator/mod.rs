//! ActuatorClient - Remote Barrier Controller
//!
//! ## Responsibilities
//!
//! - Map a gate event to the controller endpoint (/entrada, /salida)
//! - Issue the HTTP GET with a short timeout
//!
//! At-most-once signaling: no retry, and every failure (timeout, refused
//! connection, non-2xx) is surfaced as an `Error::Actuator` that callers
//! log and move past. A dead barrier controller must never stop plate
//! capture.

use crate::error::{Error, Result};
use crate::registry::GateEvent;
use std::time::Duration;

/// ActuatorClient instance
pub struct ActuatorClient {
    client: reqwest::Client,
    base_url: String,
}

impl ActuatorClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Signal the barrier for `event`. Success is any 2xx status.
    pub async fn trigger(&self, event: GateEvent) -> Result<()> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), event.as_str());
        tracing::debug!(url = %url, "Triggering barrier");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::Actuator(format!(
                "barrier controller answered {status} for {url}"
            )));
        }

        tracing::info!(event = %event, status = %status, "Barrier triggered");
        Ok(())
    }
}
