//! RGB and CIE xy color representations.
//!
//! The bridge drives its lamps from an xy chromaticity plus a brightness
//! value, while everything user-facing speaks hex RGB. The two conversions
//! here are lossy by design: the forward and reverse matrices are the ones
//! the bridge firmware expects and are *not* exact inverses of each other.
//! Do not replace either with the algebraic inverse of the other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// sRGB to CIE XYZ, applied after gamma expansion.
const SRGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

/// CIE XYZ to linear sRGB. Not the inverse of [`SRGB_TO_XYZ`].
const XYZ_TO_SRGB: [[f64; 3]; 3] = [
    [3.240625, -1.537208, -0.498629],
    [-0.968931, 1.875756, 0.041518],
    [0.055710, -0.204021, 1.056996],
];

/// An sRGB color with red, green, and blue components (0-255 each).
///
/// Parses from and renders to the canonical 6-hex-digit form:
///
/// ```
/// use hue_lights_rs::Rgb;
///
/// let color: Rgb = "#FF8800".parse().unwrap();
/// assert_eq!(color.to_string(), "#ff8800");
/// assert_eq!("ff8800".parse::<Rgb>().unwrap(), color);
/// ```
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Rgb {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Rgb {
    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// The canonical lowercase `#rrggbb` form.
    pub fn hex(&self) -> String {
        self.to_string()
    }

    /// Convert to the bridge's xy chromaticity and brightness model.
    ///
    /// Black has no defined chromaticity; it maps to `(0, 0)` with zero
    /// brightness rather than dividing by zero.
    pub fn to_xy(&self) -> XyColor {
        let red = gamma_expand(f64::from(self.red) / 255.0);
        let green = gamma_expand(f64::from(self.green) / 255.0);
        let blue = gamma_expand(f64::from(self.blue) / 255.0);

        let [xr, yr, zr] = [0, 1, 2].map(|row| {
            red * SRGB_TO_XYZ[row][0] + green * SRGB_TO_XYZ[row][1] + blue * SRGB_TO_XYZ[row][2]
        });

        let sum = xr + yr + zr;
        if sum == 0.0 {
            return XyColor::new(0.0, 0.0, 0);
        }

        XyColor {
            x: xr / sum,
            y: yr / sum,
            brightness: (yr * 254.0).round().clamp(0.0, 254.0) as u8,
        }
    }
}

impl FromStr for Rgb {
    type Err = Error;

    /// Parse from a 6-hex-digit string, with or without a leading `#`.
    fn from_str(s: &str) -> Result<Self, Error> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidColorFormat(s.to_string()));
        }

        let channel = |at: usize| {
            u8::from_str_radix(&digits[at..at + 2], 16)
                .map_err(|_| Error::InvalidColorFormat(s.to_string()))
        };
        Ok(Rgb {
            red: channel(0)?,
            green: channel(2)?,
            blue: channel(4)?,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// A color in the bridge's native model: CIE xy chromaticity plus a
/// brightness value in `0..=254`.
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct XyColor {
    pub x: f64,
    pub y: f64,
    pub brightness: u8,
}

impl XyColor {
    pub fn new(x: f64, y: f64, brightness: u8) -> Self {
        Self { x, y, brightness }
    }

    /// Convert back to a display RGB color.
    ///
    /// Out-of-gamut chromaticities clip channel-wise to zero. Fails with
    /// [`Error::InvalidChromaticity`] when `y` is zero; the bridge never
    /// legitimately reports that, but it would otherwise turn into NaN.
    ///
    /// ```
    /// use hue_lights_rs::XyColor;
    ///
    /// let white = XyColor::new(0.3127, 0.3290, 254);
    /// let rgb = white.to_rgb().unwrap();
    /// assert_eq!(rgb.to_string(), "#ffffff");
    /// ```
    pub fn to_rgb(&self) -> Result<Rgb, Error> {
        if self.y == 0.0 {
            return Err(Error::InvalidChromaticity {
                x: self.x,
                y: self.y,
            });
        }

        let yr = f64::from(self.brightness) / 254.0;
        let xr = (yr / self.y) * self.x;
        let zr = (yr / self.y) * (1.0 - self.x - self.y);

        let [red, green, blue] = [0, 1, 2].map(|row| {
            let linear =
                xr * XYZ_TO_SRGB[row][0] + yr * XYZ_TO_SRGB[row][1] + zr * XYZ_TO_SRGB[row][2];
            (gamma_compress(linear.max(0.0)) * 255.0).round().clamp(0.0, 255.0) as u8
        });

        Ok(Rgb { red, green, blue })
    }
}

/// Inverse sRGB gamma: display channel in [0,1] to linear intensity.
fn gamma_expand(value: f64) -> f64 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// Forward sRGB gamma: linear intensity to display channel.
fn gamma_compress(value: f64) -> f64 {
    if value <= 0.0031308 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}
