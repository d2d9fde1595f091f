use anyhow::Context;

use crate::error::TuftResult;

/// Decoded RGBA8 pixels, straight (non-premultiplied) alpha.
///
/// Straight alpha is the engine's pixel contract: the classifier compares RGB
/// channels against palette entries directly, which premultiplication would
/// distort wherever alpha < 255.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }
}

pub fn decode(bytes: &[u8]) -> TuftResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Raster {
        width,
        height,
        data: rgba.into_raw(),
    })
}

pub fn encode_png(raster: &Raster) -> TuftResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(raster.width, raster.height, raster.data.clone())
        .context("raster buffer does not match its dimensions")?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// Nearest-neighbor resample, preserving hard region edges.
pub fn resize_nearest(raster: &Raster, width: u32, height: u32) -> TuftResult<Raster> {
    let img = image::RgbaImage::from_raw(raster.width, raster.height, raster.data.clone())
        .context("raster buffer does not match its dimensions")?;
    let resized = image::imageops::resize(&img, width, height, image::imageops::FilterType::Nearest);
    Ok(Raster {
        width,
        height,
        data: resized.into_raw(),
    })
}

/// Convert premultiplied RGBA8 (as produced by the svg rasterizer) back to
/// straight alpha so it composites under the engine's pixel contract.
pub fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
