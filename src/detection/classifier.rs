use std::collections::HashSet;
use std::sync::OnceLock;

use image::Rgba;

const RED_RANGE: std::ops::RangeInclusive<u8> = 206..=214;
const GREEN_RANGE: std::ops::RangeInclusive<u8> = 40..=44;
const BLUE_RANGE: std::ops::RangeInclusive<u8> = 40..=44;

static BOBBER_COLORS: OnceLock<HashSet<[u8; 3]>> = OnceLock::new();

/// Every RGB triple the bobber can render as. Built on first use and shared
/// read-only for the rest of the process.
pub fn bobber_colors() -> &'static HashSet<[u8; 3]> {
    BOBBER_COLORS.get_or_init(|| {
        let mut colors = HashSet::new();
        for r in RED_RANGE {
            for g in GREEN_RANGE {
                for b in BLUE_RANGE {
                    colors.insert([r, g, b]);
                }
            }
        }
        colors
    })
}

/// Exact membership test against the bobber palette. Alpha is ignored.
pub fn is_marker(pixel: &Rgba<u8>) -> bool {
    let Rgba([r, g, b, _]) = *pixel;
    bobber_colors().contains(&[r, g, b])
}
