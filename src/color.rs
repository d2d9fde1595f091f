use crate::error::{TuftError, TuftResult};

/// Per-channel tolerance used when masking or solo-isolating palette colors.
///
/// Wider than [`RECOLOR_TOLERANCE`] on purpose: hide/solo masking wants to be
/// generous so regions stay visually legible at small scale, even where lossy
/// re-encoding nudged pixel values off the recorded palette entry.
pub const MASK_TOLERANCE: u8 = 12;

/// Per-channel tolerance used when recoloring. Tighter than masking so a
/// recolor captures only "this palette entry's own" pixels.
pub const RECOLOR_TOLERANCE: u8 = 8;

/// Brightness factor applied to non-target pixels in solo isolation.
pub const SOLO_DIM_FACTOR: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    pub fn from_hex(hex: &str) -> TuftResult<Self> {
        let s = hex.strip_prefix('#').unwrap_or(hex);
        if s.len() != 6 || !s.is_ascii() {
            return Err(TuftError::validation(format!(
                "hex color must be 6 hex digits, got '{hex}'"
            )));
        }
        let parse = |r: &str| {
            u8::from_str_radix(r, 16)
                .map_err(|_| TuftError::validation(format!("invalid hex color '{hex}'")))
        };
        Ok(Self(parse(&s[0..2])?, parse(&s[2..4])?, parse(&s[4..6])?))
    }
}

/// The single membership test shared by masking, solo isolation, and recolor.
///
/// True iff every channel's absolute difference is within `tolerance`. The
/// processed raster is a re-encoded image, so stored pixel values can deviate
/// slightly from the exact palette RGB recorded at quantization time; equality
/// would miss those pixels.
pub fn matches(pixel: Rgb, target: Rgb, tolerance: u8) -> bool {
    pixel.0.abs_diff(target.0) <= tolerance
        && pixel.1.abs_diff(target.1) <= tolerance
        && pixel.2.abs_diff(target.2) <= tolerance
}
