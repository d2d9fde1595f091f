//! Bulk pixel reclassification against the active palette.
//!
//! Masking, solo isolation, and recolor all answer the same question — "does
//! this pixel belong to palette color X?" — through [`color::matches`]. The
//! three call sites share this one scan so they can never disagree on
//! membership.

use rayon::prelude::*;

use crate::{
    color::{self, Rgb, SOLO_DIM_FACTOR},
    error::{TuftError, TuftResult},
};

/// One pass over an RGBA8 buffer.
#[derive(Clone, Debug)]
pub enum Rule<'a> {
    /// Pixels matching any color in `hidden` become fully transparent.
    /// `hidden` must be given in palette order; when tolerance windows
    /// overlap, the first matching entry wins.
    Mask { hidden: &'a [Rgb] },
    /// Pixels matching `target` are left alone; everything else has its RGB
    /// channels dimmed by [`SOLO_DIM_FACTOR`], alpha preserved.
    Isolate { target: Rgb },
    /// Pixels matching `from` have their RGB overwritten with `to`.
    Recolor { from: Rgb, to: Rgb },
}

/// Apply `rule` to every pixel of a straight-alpha RGBA8 buffer in place.
///
/// O(pixels × |palette subset considered|); invoked on every visibility or
/// solo change and once per recolor commit. Rows are scanned in parallel.
pub fn reclassify(rgba: &mut [u8], rule: &Rule<'_>, tolerance: u8) -> TuftResult<()> {
    if !rgba.len().is_multiple_of(4) {
        return Err(TuftError::validation(
            "reclassify expects an rgba8 buffer (length divisible by 4)",
        ));
    }

    rgba.par_chunks_mut(4 * 1024).for_each(|span| {
        for px in span.chunks_exact_mut(4) {
            apply_one(px, rule, tolerance);
        }
    });
    Ok(())
}

fn apply_one(px: &mut [u8], rule: &Rule<'_>, tolerance: u8) {
    let pixel = Rgb(px[0], px[1], px[2]);
    match rule {
        Rule::Mask { hidden } => {
            if hidden.iter().any(|&h| color::matches(pixel, h, tolerance)) {
                px[3] = 0;
            }
        }
        Rule::Isolate { target } => {
            if !color::matches(pixel, *target, tolerance) {
                for c in &mut px[0..3] {
                    *c = (f32::from(*c) * SOLO_DIM_FACTOR).round() as u8;
                }
            }
        }
        Rule::Recolor { from, to } => {
            if color::matches(pixel, *from, tolerance) {
                px[0] = to.0;
                px[1] = to.1;
                px[2] = to.2;
            }
        }
    }
}
