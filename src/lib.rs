//! # hue_lights_rs
//!
//! An async Rust library for controlling Philips Hue lights through a Hue
//! bridge's local HTTP API.
//!
//! This crate covers finding a bridge on your network, running the
//! link-button pairing handshake that makes the bridge issue a username,
//! listing the lights behind it, toggling them, and changing their colors
//! from ordinary hex RGB strings.
//!
//! ## Quick Start
//!
//! ```ignore
//! use hue_lights_rs::BridgeClient;
//!
//! async fn make_it_red() -> Result<(), hue_lights_rs::Error> {
//!     let client = BridgeClient::new();
//!
//!     // Probe the bridge and pair with it. Pairing polls for up to two
//!     // minutes while you walk over and press the physical link button.
//!     let mut bridge = client.detect_bridge("192.168.1.2").await?;
//!     client.pair(&mut bridge).await?;
//!
//!     for mut light in client.list_lights(&bridge).await {
//!         client.change_color(&bridge, &mut light, "#ff0000", false).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Discovery**: verify a user-entered address with
//!   [`BridgeClient::detect_bridge`], or plug a platform SSDP scanner into
//!   [`Discovery`] to find bridges automatically
//! - **Pairing**: the link-button handshake with [`BridgeClient::pair`],
//!   bounded by a two-minute deadline
//! - **Colors**: lossy but firmware-faithful conversion between hex RGB
//!   and the bridge's CIE xy + brightness model with [`Rgb`] and
//!   [`XyColor`]
//! - **Persistence**: issued usernames survive restarts behind the
//!   [`KeyValueStore`] seam ([`FileStore`] on disk, [`MemoryStore`] for
//!   tests)
//! - **Throttling**: color changes pass a shared [`RateLimiter`] so a
//!   color-picker drag doesn't flood the bridge
//!
//! ## Communication
//!
//! Bridges speak plain HTTP on port 80 of the local network; there is no
//! cloud round trip. All calls are driven by the caller: nothing polls in
//! the background, and the only long-running operation is the pairing loop
//! itself.

mod bridge;
mod color;
mod discovery;
mod errors;
mod light;
mod rate_limit;
mod store;
mod transport;

// Re-export public API
pub use bridge::{Bridge, BridgeClient};
pub use color::{Rgb, XyColor};
pub use discovery::{Discovery, ServiceScanner};
pub use errors::Error;
pub use light::{Light, LightState};
pub use rate_limit::RateLimiter;
pub use store::{CredentialStore, FileStore, KeyValueStore, MemoryStore};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
