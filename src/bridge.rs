//! Bridge records and the protocol driver for the bridge's local HTTP API.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::{self, Instant};

use crate::color::{Rgb, XyColor};
use crate::errors::Error;
use crate::light::Light;
use crate::rate_limit::RateLimiter;
use crate::store::{CredentialStore, KeyValueStore, MemoryStore};
use crate::transport::{HttpTransport, ReqwestTransport};

type Result<T> = std::result::Result<T, Error>;

/// A known Hue bridge on the local network.
///
/// A bridge starts out as little more than an address. Verifying its device
/// description fills in `uuid`; a successful pairing handshake fills in
/// `account`, the username the bridge issued for this client. The
/// serialized layout matches what earlier clients stored, so an existing
/// account list loads as-is.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Bridge {
    /// Dotted-quad address of the bridge.
    pub ip: String,
    /// The UDN from the bridge's device description, once verified.
    pub uuid: Option<String>,
    /// Username issued by the bridge when pairing succeeded.
    pub account: Option<String>,
    pub name: String,
}

impl Bridge {
    const DEFAULT_NAME: &'static str = "Hue Bridge";

    pub fn new(ip: &str, name: &str) -> Self {
        Bridge {
            ip: ip.to_string(),
            uuid: None,
            account: None,
            name: name.to_string(),
        }
    }

    /// A bridge found by probing, carrying its verified UDN.
    pub(crate) fn discovered(ip: &str, uuid: String) -> Self {
        Bridge {
            uuid: Some(uuid),
            ..Bridge::new(ip, Self::DEFAULT_NAME)
        }
    }

    /// Whether pairing has issued a usable username for this bridge.
    pub fn is_paired(&self) -> bool {
        self.account
            .as_deref()
            .is_some_and(|account| !account.trim().is_empty())
    }

    pub(crate) fn same_identity(&self, other: &Bridge) -> bool {
        self.ip == other.ip || (self.uuid.is_some() && self.uuid == other.uuid)
    }
}

// Wire shape of a pairing reply: a one-element array holding either an
// "error" or a "success" object.
#[derive(Deserialize)]
struct PairReply {
    error: Option<PairError>,
    success: Option<PairSuccess>,
}

#[derive(Deserialize)]
struct PairError {
    #[serde(rename = "type")]
    kind: u16,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct PairSuccess {
    username: String,
}

// Wire shape of one entry in the lights collection.
#[derive(Deserialize)]
struct LightAttributes {
    state: crate::light::LightState,
    #[serde(rename = "type")]
    kind: String,
    name: String,
}

/// Client for all bridge network interactions.
///
/// Holds the HTTP transport, the credential store that remembers issued
/// usernames, and the rate limiter gating color changes. One client serves
/// any number of bridges; it keeps no per-bridge state of its own.
///
/// # Example
///
/// ```ignore
/// use hue_lights_rs::{Bridge, BridgeClient};
///
/// async fn turn_everything_on() -> Result<(), hue_lights_rs::Error> {
///     let client = BridgeClient::new();
///     let mut bridge = client.detect_bridge("192.168.1.2").await?;
///     client.pair(&mut bridge).await?; // go press the link button!
///
///     for mut light in client.list_lights(&bridge).await {
///         if !light.state.on {
///             client.toggle_light(&bridge, &mut light).await?;
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct BridgeClient<T = ReqwestTransport, S = MemoryStore> {
    transport: T,
    accounts: CredentialStore<S>,
    limiter: RateLimiter,
}

impl BridgeClient {
    /// Client with the reqwest transport, in-memory credentials, and the
    /// default color-change throttle.
    pub fn new() -> Self {
        BridgeClient::with_parts(
            ReqwestTransport::new(),
            CredentialStore::new(MemoryStore::new()),
            RateLimiter::default(),
        )
    }
}

impl Default for BridgeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HttpTransport, S: KeyValueStore> BridgeClient<T, S> {
    /// Application identifier sent with pairing requests.
    const DEVICE_TYPE: &'static str = "hue_lights_rs";
    /// How long the pairing loop keeps polling for a button press.
    const PAIR_DEADLINE: Duration = Duration::from_secs(120);
    /// Wait between polls while the button hasn't been pressed.
    const LINK_RETRY_DELAY: Duration = Duration::from_secs(5);
    /// Bridge error code for "link button not pressed".
    const LINK_BUTTON_NOT_PRESSED: u16 = 101;

    /// Assemble a client from its parts.
    ///
    /// The limiter is taken by value on purpose: build it once at startup
    /// and give it to the one client the application routes calls through.
    pub fn with_parts(transport: T, accounts: CredentialStore<S>, limiter: RateLimiter) -> Self {
        BridgeClient {
            transport,
            accounts,
            limiter,
        }
    }

    /// The credential store backing this client.
    pub fn accounts(&self) -> &CredentialStore<S> {
        &self.accounts
    }

    /// Fetch a device description and verify it belongs to a Hue bridge.
    ///
    /// `location_url` is expected to serve an XML device description.
    /// Returns the bridge's UDN, its stable unique identifier. Fails with
    /// [`Error::UnexpectedContentType`] when the response isn't declared as
    /// XML and [`Error::NotAHueBridge`] when no `friendlyName` element
    /// names a Hue Bridge.
    pub async fn verify_identity(&self, location_url: &str) -> Result<String> {
        let response = self.transport.get(location_url).await?;

        if !is_xml(response.content_type.as_deref()) {
            return Err(Error::UnexpectedContentType(response.content_type));
        }

        let friendly = element_text(&response.body, "friendlyName");
        if !friendly.is_some_and(|name| name.contains("Hue Bridge")) {
            return Err(Error::NotAHueBridge(location_url.to_string()));
        }

        match element_text(&response.body, "UDN") {
            Some(udn) => Ok(udn.to_string()),
            None => Err(Error::NotAHueBridge(location_url.to_string())),
        }
    }

    /// Probe an address for a Hue bridge.
    ///
    /// Builds the well-known description URL for `ip`, verifies it, and
    /// returns an unpaired [`Bridge`] record carrying the verified UDN.
    pub async fn detect_bridge(&self, ip: &str) -> Result<Bridge> {
        let uuid = self
            .verify_identity(&format!("http://{ip}/description.xml"))
            .await?;
        Ok(Bridge::discovered(ip, uuid))
    }

    /// Run the link-button pairing handshake against `bridge`.
    ///
    /// The bridge only issues a username while its physical link button has
    /// recently been pressed, so this polls: every reply of "link button
    /// not pressed" (error 101) waits five seconds and tries again, bounded
    /// by a two-minute deadline from the first attempt. On success the
    /// issued username is recorded on `bridge` and the bridge is persisted
    /// in the credential store; running past the deadline fails with
    /// [`Error::PairingTimedOut`].
    ///
    /// Empty and garbled reply bodies are retried immediately, since some
    /// firmware revisions mangle their own JSON. Any other error reply is
    /// fatal [`Error::PairingFailed`].
    pub async fn pair(&self, bridge: &mut Bridge) -> Result<()> {
        let url = format!("http://{}/api", bridge.ip);
        let request = json!({ "devicetype": Self::DEVICE_TYPE }).to_string();
        let start = Instant::now();

        while start.elapsed() < Self::PAIR_DEADLINE {
            let response = self.transport.post(&url, request.clone()).await?;
            if response.body.is_empty() {
                continue;
            }

            let replies: Vec<PairReply> = match parse_repaired(&response.body) {
                Ok(replies) => replies,
                Err(err) => {
                    debug!("retrying garbled pairing reply from {}: {err}", bridge.ip);
                    continue;
                }
            };
            let Some(reply) = replies.into_iter().next() else {
                return Err(Error::PairingFailed("empty reply from bridge".to_string()));
            };

            if let Some(error) = reply.error {
                if error.kind == Self::LINK_BUTTON_NOT_PRESSED {
                    time::sleep(Self::LINK_RETRY_DELAY).await;
                    continue;
                }
                return Err(Error::PairingFailed(error.description));
            }

            let Some(success) = reply.success else {
                return Err(Error::PairingFailed(
                    "unrecognized reply from bridge".to_string(),
                ));
            };

            debug!("bridge {} issued username", bridge.ip);
            bridge.account = Some(success.username);
            self.accounts.add_bridge(bridge);
            return Ok(());
        }

        Err(Error::PairingTimedOut(Self::PAIR_DEADLINE))
    }

    /// Fetch the bridge's lights, swallowing failures.
    ///
    /// A bridge that can't be read yields an empty list and a log line, so
    /// one broken bridge empties its view instead of taking the caller
    /// down. Use [`try_list_lights`](Self::try_list_lights) when the
    /// failure itself matters.
    pub async fn list_lights(&self, bridge: &Bridge) -> Vec<Light> {
        match self.try_list_lights(bridge).await {
            Ok(lights) => lights,
            Err(err) => {
                warn!("listing lights on {} failed: {err}", bridge.ip);
                Vec::new()
            }
        }
    }

    /// Fetch the bridge's lights, propagating failures.
    ///
    /// Each light's display color is derived from its reported xy state.
    pub async fn try_list_lights(&self, bridge: &Bridge) -> Result<Vec<Light>> {
        let url = format!("{}/lights", self.account_url(bridge)?);
        let response = self.transport.get(&url).await?;
        let lights: BTreeMap<String, LightAttributes> = parse_repaired(&response.body)?;

        lights
            .into_iter()
            .map(|(id, attributes)| {
                let rgb = XyColor::new(
                    attributes.state.xy[0],
                    attributes.state.xy[1],
                    attributes.state.bri,
                )
                .to_rgb()?;
                Ok(Light {
                    id,
                    name: attributes.name,
                    kind: attributes.kind,
                    state: attributes.state,
                    rgb,
                })
            })
            .collect()
    }

    /// Flip a light's power state.
    ///
    /// The local copy is updated only after the bridge accepts the change.
    pub async fn toggle_light(&self, bridge: &Bridge, light: &mut Light) -> Result<()> {
        let url = self.light_state_url(bridge, light)?;
        let body = json!({ "on": !light.state.on }).to_string();
        self.transport.put(&url, body).await?;

        light.state.on = !light.state.on;
        Ok(())
    }

    /// Change a light's color from a hex string.
    ///
    /// Calls landing inside the rate-limit window are dropped without
    /// effect or error; a drag across a color picker fires far faster than
    /// the bridge can apply. With `lock_brightness` the light keeps its
    /// current brightness and only the chromaticity changes; otherwise the
    /// brightness derived from the new color is sent along. The local copy
    /// is updated after the bridge accepts the change.
    pub async fn change_color(
        &self,
        bridge: &Bridge,
        light: &mut Light,
        color: &str,
        lock_brightness: bool,
    ) -> Result<()> {
        if !self.limiter.try_acquire() {
            return Ok(());
        }

        let rgb: Rgb = color.parse()?;
        let xy = rgb.to_xy();
        let bri = if lock_brightness {
            light.state.bri
        } else {
            xy.brightness
        };

        let url = self.light_state_url(bridge, light)?;
        let body = json!({ "xy": [xy.x, xy.y], "bri": bri }).to_string();
        self.transport.put(&url, body).await?;

        light.state.xy = [xy.x, xy.y];
        light.state.bri = bri;
        light.rgb = rgb;
        Ok(())
    }

    fn account_url(&self, bridge: &Bridge) -> Result<String> {
        let account = bridge
            .account
            .as_deref()
            .filter(|account| !account.trim().is_empty())
            .ok_or_else(|| Error::NotPaired(bridge.ip.clone()))?;
        Ok(format!("http://{}/api/{account}", bridge.ip))
    }

    fn light_state_url(&self, bridge: &Bridge, light: &Light) -> Result<String> {
        Ok(format!(
            "{}/lights/{}/state",
            self.account_url(bridge)?,
            light.id
        ))
    }
}

/// Parse a bridge response body, tolerating one firmware quirk: some
/// revisions drop the final closing brace of a response. A single repair
/// attempt appends it and re-parses; this is deliberately not a general
/// JSON fixer.
fn parse_repaired<D: DeserializeOwned>(body: &str) -> Result<D> {
    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(err) => {
            let repaired = format!("{}}}", body.trim_end());
            serde_json::from_str(&repaired).map_err(|_| Error::MalformedResponse(err))
        }
    }
}

fn is_xml(content_type: Option<&str>) -> bool {
    let Some(declared) = content_type else {
        return false;
    };
    let media_type = declared.split(';').next().unwrap_or(declared).trim();
    matches!(media_type, "text/xml" | "application/xml")
}

/// Extract the text of the first `<tag>…</tag>` element.
///
/// The bridge's description.xml is flat and attribute-free; two tag lookups
/// don't warrant an XML parser.
fn element_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].trim())
}
