use serde::{Deserialize, Serialize};

/// Color representation.
///
/// Serialized as a HEX8 string (`#RRGGBBAA`). Deserialization also accepts HEX6.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from_hex(&value).ok_or_else(|| format!("invalid color `{value}`"))
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Color {
    /// White color: `#FFFFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Black color: `#000000FF`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    /// Default layer blue: `#3498DBFF`
    pub const BLUE: Color = Color::from_hex("#3498db");
    /// Darker blue used for outlines: `#2980B9FF`
    pub const DARK_BLUE: Color = Color::from_hex("#2980b9");
    /// Highlight red: `#E74C3CFF`
    pub const RED: Color = Color::from_hex("#e74c3c");
    /// Route orange: `#E67E22FF`
    pub const ORANGE: Color = Color::from_hex("#e67e22");

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Converts the color into HEX8 string: `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Converts the color into a CSS color string as understood by style documents.
    ///
    /// Opaque colors are written as `#rrggbb`, translucent ones as `rgba(r, g, b, a)`.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                self.a as f64 / 255.0
            )
        }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`. Returns `None` for anything else.
    pub fn try_from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !matches!(digits.len(), 6 | 8) || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |at: usize| u8::from_str_radix(&digits[at..at + 2], 16).ok();
        let a = match digits.len() {
            8 => channel(6)?,
            _ => 255,
        };

        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }

    /// Const version of [`Color::try_from_hex`] for palette constants.
    ///
    /// # Panics
    ///
    /// Panics if the string is not `#RRGGBB` or `#RRGGBBAA`.
    pub const fn from_hex(hex: &'static str) -> Self {
        let bytes = hex.as_bytes();
        assert!(
            matches!(bytes.len(), 7 | 9) && bytes[0] == b'#',
            "color must be #RRGGBB or #RRGGBBAA"
        );

        let a = if bytes.len() == 9 {
            hex_channel(bytes, 7)
        } else {
            255
        };

        Self {
            r: hex_channel(bytes, 1),
            g: hex_channel(bytes, 3),
            b: hex_channel(bytes, 5),
            a,
        }
    }

    /// Returns a new color instance, copied from the base one but with the given alpha channel.
    pub fn with_alpha(&self, a: u8) -> Self {
        Self { a, ..*self }
    }

    /// Opacity component of the color.
    pub fn a(&self) -> u8 {
        self.a
    }
}

const fn hex_channel(bytes: &[u8], at: usize) -> u8 {
    nibble(bytes[at]) << 4 | nibble(bytes[at + 1])
}

const fn nibble(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => panic!("invalid hex digit in color"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_serialization() {
        let hex = "#FF1000AA";
        let color = Color::try_from_hex(hex).unwrap();
        assert_eq!(&color.to_hex(), hex);

        assert_eq!(Color::from_hex(hex), color);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert_eq!(Color::try_from_hex("#3498DB"), Some(Color::BLUE));
        assert_eq!(Color::try_from_hex("3498db"), None);
        assert_eq!(Color::try_from_hex("#+498db"), None);
        assert_eq!(Color::try_from_hex("#3498d"), None);
        assert_eq!(Color::try_from_hex("#3498dbé"), None);
    }

    #[test]
    fn css_output_depends_on_opacity() {
        assert_eq!(Color::BLUE.to_css(), "#3498db");
        assert_eq!(Color::BLACK.with_alpha(0).to_css(), "rgba(0, 0, 0, 0.000)");
    }

    #[test]
    fn deserialization_rejects_garbage() {
        let parsed: Result<Color, _> = serde_json::from_str("\"blue\"");
        assert!(parsed.is_err());

        let parsed: Color = serde_json::from_str("\"#e74c3c\"").unwrap();
        assert_eq!(parsed, Color::RED);
    }
}
