//! RGB colors as given by shape trees.
//!
//! Colors arrive either as hex strings (`#rgb`, `#rrggbb`) or as RGB
//! triples. Triples with any component below 1 are read as fractions,
//! everything else as 0..255 channel values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{Error, Result};

/// 8-bit RGB color.
///
/// Serialized as `#rrggbb`. Deserializes from a hex string, an RGB triple
/// or an `{r, g, b}` map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Create from 0..255 channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (leading `#` optional).
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(s.to_string()));
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| Error::InvalidColor(s.to_string()));
        match hex.len() {
            3 => {
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Ok(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => Ok(Self::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            _ => Err(Error::InvalidColor(s.to_string())),
        }
    }

    /// Create from an RGB triple.
    ///
    /// `(1, 1, 1)` is read as 0..255 values; use `(255, 255, 255)` for white.
    pub fn from_rgb_f64(rgb: [f64; 3]) -> Result<Self> {
        if rgb.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(Error::InvalidColor(format!("{rgb:?}")));
        }
        let scale = if rgb.iter().any(|c| *c < 1.0) { 255.0 } else { 1.0 };
        let to_u8 = |c: f64| (c * scale).round().clamp(0.0, 255.0) as u8;
        Ok(Self::rgb(to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2])))
    }

    /// CSS hex notation, `#rrggbb`.
    pub fn web_color(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels as fractions in 0..1.
    pub fn percentage(&self) -> [f32; 3] {
        [self.r as f32 / 255.0, self.g as f32 / 255.0, self.b as f32 / 255.0]
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.web_color())
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.web_color()
    }
}

/// Accepted serialized forms of [`Color`].
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Triple([f64; 3]),
    Channels { r: u8, g: u8, b: u8 },
}

impl TryFrom<ColorRepr> for Color {
    type Error = Error;

    fn try_from(repr: ColorRepr) -> Result<Self> {
        match repr {
            ColorRepr::Hex(s) => Self::from_hex(&s),
            ColorRepr::Triple(rgb) => Self::from_rgb_f64(rgb),
            ColorRepr::Channels { r, g, b } => Ok(Self::rgb(r, g, b)),
        }
    }
}

/// Color assignment of a leaf.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ColorSpec {
    /// Use the renderer's default color for the primitive kind.
    #[default]
    Default,
    /// One color broadcast to every primitive.
    Single(Color),
    /// One color per primitive (edge or vertex).
    PerPrimitive(Vec<Color>),
}

impl ColorSpec {
    /// First concrete color, if any.
    pub fn first(&self) -> Option<Color> {
        match self {
            ColorSpec::Default => None,
            ColorSpec::Single(c) => Some(*c),
            ColorSpec::PerPrimitive(list) => list.first().copied(),
        }
    }
}

impl From<Color> for ColorSpec {
    fn from(c: Color) -> Self {
        ColorSpec::Single(c)
    }
}

impl From<Vec<Color>> for ColorSpec {
    fn from(list: Vec<Color>) -> Self {
        ColorSpec::PerPrimitive(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(Color::from_hex("#ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::from_hex("0f0").unwrap(), Color::rgb(0, 255, 0));
        assert_eq!("#E8B024".parse::<Color>().unwrap(), Color::rgb(232, 176, 36));
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
        // multi-byte characters and sign prefixes are not hex digits
        assert!(matches!(Color::from_hex("#aé000"), Err(Error::InvalidColor(_))));
        assert!(matches!(Color::from_hex("#+f+f+f"), Err(Error::InvalidColor(_))));
        assert!(Color::from_hex("+ff").is_err());
    }

    #[test]
    fn test_serde_forms() {
        let hex: Color = serde_json::from_str(r##""#e8b024""##).unwrap();
        assert_eq!(hex, Color::rgb(232, 176, 36));
        let fractions: Color = serde_json::from_str("[1.0, 0.5, 0.0]").unwrap();
        assert_eq!(fractions, Color::rgb(255, 128, 0));
        let channels: Color = serde_json::from_str(r#"{"r": 1, "g": 2, "b": 3}"#).unwrap();
        assert_eq!(channels, Color::rgb(1, 2, 3));
        assert_eq!(serde_json::to_string(&Color::rgb(166, 166, 166)).unwrap(), r##""#a6a6a6""##);
        assert!(serde_json::from_str::<Color>(r##""#+f+f+f""##).is_err());
    }

    #[test]
    fn test_rgb_triples() {
        assert_eq!(Color::from_rgb_f64([1.0, 0.0, 1.0]).unwrap(), Color::rgb(255, 0, 255));
        assert_eq!(Color::from_rgb_f64([232.0, 176.0, 36.0]).unwrap(), Color::rgb(232, 176, 36));
        // all components >= 1 means channel values
        assert_eq!(Color::from_rgb_f64([1.0, 1.0, 1.0]).unwrap(), Color::rgb(1, 1, 1));
        assert!(Color::from_rgb_f64([f64::NAN, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_web_color_and_percentage() {
        let c = Color::rgb(166, 166, 166);
        assert_eq!(c.web_color(), "#a6a6a6");
        assert_eq!(c.to_string(), "#a6a6a6");
        assert_eq!(Color::rgb(255, 0, 0).percentage(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_color_spec_first() {
        assert_eq!(ColorSpec::Default.first(), None);
        assert_eq!(ColorSpec::PerPrimitive(vec![]).first(), None);
        let spec: ColorSpec = vec![Color::rgb(1, 2, 3), Color::rgb(4, 5, 6)].into();
        assert_eq!(spec.first(), Some(Color::rgb(1, 2, 3)));
    }
}
