use std::fmt;
use std::str::FromStr;

/// Straight-alpha sRGB color with 8-bit channels.
///
/// Surfaces store pixels in exactly this layout, so no conversion happens
/// between the palette and the pixel buffer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`; the leading `#` is optional.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !matches!(hex.len(), 6 | 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError(s.to_string()));
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub const fn from_array(px: [u8; 4]) -> Self {
        Self::rgba(px[0], px[1], px[2], px[3])
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex color {:?}", self.0)
    }
}

impl std::error::Error for ColorParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_hex() {
        assert_eq!(Color::from_hex("#FF3F3F"), Ok(Color::rgb(0xFF, 0x3F, 0x3F)));
        assert_eq!(Color::from_hex("1e1e1e"), Ok(Color::rgb(0x1E, 0x1E, 0x1E)));
    }

    #[test]
    fn parses_eight_digit_hex() {
        assert_eq!(Color::from_hex("#00000080"), Ok(Color::rgba(0, 0, 0, 0x80)));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Color::from_hex("#FFF").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
        assert!(Color::from_hex("").is_err());
        assert!(Color::from_hex("#ÿÿÿ").is_err());
    }

    #[test]
    fn display_round_trips() {
        let c = Color::rgb(0x60, 0xA5, 0xFA);
        assert_eq!(c.to_string(), "#60A5FA");
        assert_eq!(c.to_string().parse::<Color>(), Ok(c));
        assert_eq!(Color::TRANSPARENT.to_string(), "#00000000");
    }
}
