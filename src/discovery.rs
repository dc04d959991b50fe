//! Bridge discovery via an external SSDP-like scan capability.

use std::future::Future;

use log::{info, warn};
use url::Url;

use crate::bridge::{Bridge, BridgeClient};
use crate::errors::Error;
use crate::store::KeyValueStore;
use crate::transport::HttpTransport;

type Result<T> = std::result::Result<T, Error>;

/// An external service-discovery capability (SSDP or similar).
///
/// A search yields candidate device-description URLs for a service type.
/// This library ships no scanner of its own; the embedding platform
/// provides one when it has one, and discovery stays inert otherwise.
pub trait ServiceScanner: Send + Sync {
    fn search(&self, service_type: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Finds Hue bridges on the local network when a [`ServiceScanner`] is
/// available.
///
/// Built with `None`, every scan comes back empty; callers fall back to
/// asking the user for an address and
/// [`BridgeClient::detect_bridge`](crate::BridgeClient::detect_bridge).
pub struct Discovery<C> {
    scanner: Option<C>,
}

impl<C: ServiceScanner> Discovery<C> {
    const SERVICE_TYPE: &'static str = "ssdp:all";

    pub fn new(scanner: Option<C>) -> Self {
        Discovery { scanner }
    }

    /// Whether a scan capability is present.
    pub fn is_available(&self) -> bool {
        self.scanner.is_some()
    }

    /// Search the network and verify every candidate device description.
    ///
    /// Candidates that don't serve a description document, can't be
    /// reached, or turn out not to be Hue bridges are logged and skipped.
    /// Results are deduplicated by address.
    pub async fn scan<T, S>(&self, client: &BridgeClient<T, S>) -> Result<Vec<Bridge>>
    where
        T: HttpTransport,
        S: KeyValueStore,
    {
        let Some(scanner) = &self.scanner else {
            info!("no service discovery available");
            return Ok(Vec::new());
        };

        let mut bridges: Vec<Bridge> = Vec::new();
        for location in scanner.search(Self::SERVICE_TYPE).await? {
            if !location.contains("/description.xml") {
                continue;
            }
            let Some(ip) = host_of(&location) else {
                warn!("discovery returned an unusable location: {location}");
                continue;
            };

            match client.verify_identity(&location).await {
                Ok(uuid) => {
                    if !bridges.iter().any(|bridge| bridge.ip == ip) {
                        bridges.push(Bridge::discovered(&ip, uuid));
                    }
                }
                Err(err) => warn!("skipping {location}: {err}"),
            }
        }
        Ok(bridges)
    }
}

fn host_of(location: &str) -> Option<String> {
    Url::parse(location)
        .ok()?
        .host_str()
        .map(String::from)
}
