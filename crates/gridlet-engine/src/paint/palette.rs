use gridlet_lang::{array_slot, Value};

use super::Color;

/// Fixed, ordered list of cell colors addressed by index.
///
/// Resolution mirrors reading a slot from an array: only values naming an
/// existing slot pick a palette color, everything else is the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
    fallback: Color,
}

/// The ten reference colors, red through pink.
pub const DEFAULT_COLORS: [Color; 10] = [
    Color::rgb(0xFF, 0x3F, 0x3F), // red
    Color::rgb(0xFF, 0x7F, 0x00), // orange
    Color::rgb(0xFB, 0xBF, 0x24), // yellow
    Color::rgb(0xA3, 0xE6, 0x35), // yellow-green
    Color::rgb(0x4A, 0xDE, 0x80), // green
    Color::rgb(0x22, 0xD3, 0xEE), // cyan
    Color::rgb(0x60, 0xA5, 0xFA), // blue
    Color::rgb(0x81, 0x8C, 0xF8), // indigo
    Color::rgb(0xC0, 0x84, 0xFC), // violet
    Color::rgb(0xF4, 0x72, 0xB6), // pink
];

impl Palette {
    /// Painted when a returned value names no slot.
    pub const FALLBACK: Color = Color::BLACK;

    /// Dark neutral behind the cell gaps.
    pub const BACKGROUND: Color = Color::rgb(0x1E, 0x1E, 0x1E);

    /// Returns `None` for an empty color list.
    pub fn new(colors: Vec<Color>) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        Some(Self { colors, fallback: Self::FALLBACK })
    }

    pub fn with_fallback(mut self, fallback: Color) -> Self {
        self.fallback = fallback;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    #[inline]
    pub fn fallback(&self) -> Color {
        self.fallback
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// The slot a returned value addresses, if any.
    pub fn index_of(&self, value: &Value) -> Option<usize> {
        array_slot(value).filter(|&i| i < self.colors.len())
    }

    pub fn resolve(&self, value: &Value) -> Color {
        self.index_of(value)
            .and_then(|i| self.get(i))
            .unwrap_or(self.fallback)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self { colors: DEFAULT_COLORS.to_vec(), fallback: Self::FALLBACK }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value { Value::Number(n) }

    // ── defaults ──────────────────────────────────────────────────────────

    #[test]
    fn default_matches_reference_hex() {
        let hex = [
            "#FF3F3F", "#FF7F00", "#FBBF24", "#A3E635", "#4ADE80",
            "#22D3EE", "#60A5FA", "#818CF8", "#C084FC", "#F472B6",
        ];
        let p = Palette::default();
        assert_eq!(p.len(), 10);
        for (i, h) in hex.iter().enumerate() {
            assert_eq!(p.get(i), Some(Color::from_hex(h).unwrap()), "slot {i}");
        }
        assert_eq!(p.fallback(), Color::from_hex("#000000").unwrap());
    }

    #[test]
    fn empty_palette_rejected() {
        assert!(Palette::new(Vec::new()).is_none());
    }

    // ── resolve ───────────────────────────────────────────────────────────

    #[test]
    fn integers_in_range_pick_slots() {
        let p = Palette::default();
        assert_eq!(p.resolve(&num(0.0)), DEFAULT_COLORS[0]);
        assert_eq!(p.resolve(&num(9.0)), DEFAULT_COLORS[9]);
        assert_eq!(p.resolve(&num(-0.0)), DEFAULT_COLORS[0]);
    }

    #[test]
    fn out_of_range_is_fallback() {
        let p = Palette::default();
        for v in [10.0, 99.0, -1.0, 2.5, f64::NAN, f64::INFINITY] {
            assert_eq!(p.resolve(&num(v)), Palette::FALLBACK, "{v}");
        }
    }

    #[test]
    fn non_numbers_are_fallback_except_canonical_strings() {
        let p = Palette::default();
        assert_eq!(p.resolve(&Value::Undefined), Palette::FALLBACK);
        assert_eq!(p.resolve(&Value::Null), Palette::FALLBACK);
        assert_eq!(p.resolve(&Value::Bool(true)), Palette::FALLBACK);
        assert_eq!(p.resolve(&Value::Str("3".into())), DEFAULT_COLORS[3]);
        assert_eq!(p.resolve(&Value::Str("03".into())), Palette::FALLBACK);
    }

    #[test]
    fn custom_fallback() {
        let p = Palette::new(vec![Color::rgb(1, 2, 3)]).unwrap().with_fallback(Color::rgb(9, 9, 9));
        assert_eq!(p.resolve(&num(1.0)), Color::rgb(9, 9, 9));
        assert_eq!(p.index_of(&num(0.0)), Some(0));
    }
}
