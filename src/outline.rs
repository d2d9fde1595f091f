//! Outline markup handling: stroke rewrite and on-demand rasterization.
//!
//! The service returns region boundaries as one vector graphics document
//! whose `<path>` elements carry `stroke` and `stroke-width` attributes. The
//! compositor substitutes caller-supplied values into those attributes —
//! never touching path geometry — and rasterizes the modified document at the
//! scaled draw size, which is where the outline gets its smoothed edges.

use crate::{
    color::Rgb,
    error::{TuftError, TuftResult},
    raster,
};

/// Rewrite every `stroke-width` attribute value to `width` and, when `color`
/// is given, every `stroke` attribute value to its hex form. Path data and
/// all other attributes pass through untouched.
pub fn restroke(markup: &str, width: f32, color: Option<Rgb>) -> String {
    let out = replace_attr_values(markup, "stroke-width", &format_width(width));
    match color {
        Some(rgb) => replace_attr_values(&out, "stroke", &rgb.to_hex()),
        None => out,
    }
}

fn format_width(width: f32) -> String {
    // Match the service's own formatting: no trailing ".0" noise.
    if width.fract() == 0.0 {
        format!("{}", width as i64)
    } else {
        format!("{width}")
    }
}

/// Substitute the value of every `name="..."` occurrence. `stroke-width`
/// never collides with `stroke` here because the match requires `="`
/// immediately after the attribute name.
fn replace_attr_values(markup: &str, name: &str, value: &str) -> String {
    let needle = format!("{name}=\"");
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(pos) = rest.find(&needle) {
        let value_start = pos + needle.len();
        let Some(end) = rest[value_start..].find('"') else {
            break; // unterminated attribute; leave the tail as-is
        };
        out.push_str(&rest[..value_start]);
        out.push_str(value);
        rest = &rest[value_start + end..];
    }
    out.push_str(rest);
    out
}

/// Rasterize outline markup to straight-alpha RGBA8 at the given size.
///
/// The document is scaled to fill `width`×`height`, so callers pass the
/// already-computed draw dimensions and composite the result 1:1.
pub fn rasterize(markup: &str, width: u32, height: u32) -> TuftResult<raster::Raster> {
    const MAX_DIM: u32 = 16_384;
    if width == 0 || height == 0 {
        return Err(TuftError::render("outline raster size must be non-zero"));
    }
    if width > MAX_DIM || height > MAX_DIM {
        return Err(TuftError::render(format!(
            "outline raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_str(markup, &opts)
        .map_err(|e| TuftError::decode(format!("parse outline markup: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| TuftError::render("failed to allocate outline pixmap"))?;

    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(TuftError::decode("outline markup has no size"));
    }
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    let mut data = pixmap.data().to_vec();
    raster::unpremultiply_rgba8_in_place(&mut data);
    Ok(raster::Raster {
        width,
        height,
        data,
    })
}
