//! Built-in example programs.
//!
//! Presets are plain source text. Still presets define `color(x, y)`;
//! animated presets take a third `time` argument that advances once per tick.

use crate::core::Variant;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub source: &'static str,
    /// Whether the program reads the `time` argument.
    pub animated: bool,
}

const STARTER_STILL: &str = "/*
   Edit this function to control colors.
   Return an integer 0..9 for each (x, y).
*/
function color(x, y) {
  return (x + y) % 10;
}";

const STARTER_ANIMATED: &str = "/*
   Edit this function to control colors.
   Return an integer 0..9 for each (x, y).
   `time` advances by one every tick and resets on edit.
*/
function color(x, y, time) {
  return (x + y + time) % 10;
}";

pub static PRESETS: &[Preset] = &[
    Preset {
        name: "diagonal",
        source: STARTER_STILL,
        animated: false,
    },
    Preset {
        name: "checker",
        source: "function color(x, y) {
  return (Math.floor(x / 4) + Math.floor(y / 4)) % 2 === 0 ? 0 : 6;
}",
        animated: false,
    },
    Preset {
        name: "rings",
        source: "function color(x, y) {
  const dx = x - 9.5;
  const dy = y - 9.5;
  return Math.floor(Math.sqrt(dx * dx + dy * dy)) % 10;
}",
        animated: false,
    },
    Preset {
        name: "xor",
        source: "function color(x, y) {
  return (x ^ y) % 10;
}",
        animated: false,
    },
    Preset {
        name: "stripes",
        source: "function color(x, y) {
  if (y % 5 === 0) return 9;
  return x % 3 + 4;
}",
        animated: false,
    },
    Preset {
        name: "spiral",
        source: "function color(x, y) {
  const dx = x - 10;
  const dy = y - 10;
  const angle = Math.atan2(dy, dx) / (2 * Math.PI) + 0.5;
  const radius = Math.sqrt(dx * dx + dy * dy);
  return Math.floor(angle * 10 + radius / 2) % 10;
}",
        animated: false,
    },
    Preset {
        name: "wave",
        source: STARTER_ANIMATED,
        animated: true,
    },
    Preset {
        name: "ripple",
        source: "function color(x, y, time) {
  const dx = x - 19.5;
  const dy = y - 19.5;
  const d = Math.floor(Math.sqrt(dx * dx + dy * dy) / 2);
  return (d + 100 - time % 100) % 10;
}",
        animated: true,
    },
    Preset {
        name: "scroll",
        source: "// Horizontal bands drifting down the grid.
function color(x, y, time) {
  return Math.floor((y + time) / 4) % 10;
}",
        animated: true,
    },
    Preset {
        name: "pulse",
        source: "function color(x, y, time) {
  const phase = time % 10;
  const edge = Math.max(Math.abs(x - 20), Math.abs(y - 20));
  return edge <= phase * 2 ? phase : 0;
}",
        animated: true,
    },
];

pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// Presets whose arity matches `variant`.
pub fn presets_for(variant: Variant) -> impl Iterator<Item = &'static Preset> {
    PRESETS.iter().filter(move |p| p.animated == variant.is_animated())
}

/// The commented starter program shown in a fresh editor.
pub fn default_source(variant: Variant) -> &'static str {
    match variant {
        Variant::Still => STARTER_STILL,
        Variant::Animated => STARTER_ANIMATED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlet_lang::{CellArgs, Evaluator, Value};

    fn index(v: Value) -> usize {
        gridlet_lang::array_slot(&v).unwrap_or_else(|| panic!("not a palette slot: {v:?}"))
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in PRESETS.iter().enumerate() {
            assert!(PRESETS[i + 1..].iter().all(|b| b.name != a.name), "duplicate {}", a.name);
        }
    }

    #[test]
    fn every_preset_stays_inside_the_palette() {
        for p in PRESETS {
            let mut f = Evaluator::new().compile(p.source).unwrap_or_else(|e| panic!("{}: {e}", p.name));
            let (side, time) = if p.animated { (40, Some(7)) } else { (20, None) };
            for y in 0..side {
                for x in 0..side {
                    let args = CellArgs { x, y, time };
                    let v = f.call(args).unwrap_or_else(|e| panic!("{} at ({x},{y}): {e}", p.name));
                    assert!(index(v) < 10, "{} at ({x},{y})", p.name);
                }
            }
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find_preset(" Rings ").map(|p| p.name), Some("rings"));
        assert!(find_preset("nope").is_none());
    }

    #[test]
    fn starter_programs_match_variant() {
        assert!(default_source(Variant::Still).contains("function color(x, y)"));
        assert!(default_source(Variant::Animated).contains("time"));
        assert!(presets_for(Variant::Animated).all(|p| p.animated));
        assert_eq!(presets_for(Variant::Still).count(), 6);
    }
}
