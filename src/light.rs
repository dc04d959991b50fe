//! Light records.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// The mutable state of a light, in the bridge's own terms.
///
/// `bri` runs 0 to 254 and `xy` is a CIE chromaticity pair; both travel
/// verbatim in the bridge's JSON. Fields the bridge reports beyond these
/// (hue, sat, color temperature, alerts) are ignored on the way in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LightState {
    pub on: bool,
    pub bri: u8,
    pub xy: [f64; 2],
}

/// A single light attached to a bridge.
///
/// Lights are rebuilt from scratch on every listing; the `rgb` field is the
/// display color derived from the reported xy state, and the state is
/// mutated locally once a state-changing call has been accepted by the
/// bridge.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Light {
    /// Bridge-assigned identifier, opaque to this library.
    pub id: String,
    pub name: String,
    /// The bridge's model category, e.g. "Extended color light".
    #[serde(rename = "type")]
    pub kind: String,
    pub state: LightState,
    pub rgb: Rgb,
}
