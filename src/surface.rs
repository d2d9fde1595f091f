//! Display surface target: a straight-alpha RGBA8 buffer plus the blend and
//! blit primitives the compositor draws with.

use crate::{
    error::{TuftError, TuftResult},
    raster::Raster,
};

pub type Rgba8 = [u8; 4];

/// One render target (edit canvas or projection canvas). Full redraws only;
/// a superseded render is simply overwritten by the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Surface {
    /// A fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        let i = self.idx(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Source-over one pixel at `(x, y)`, `src` scaled by `opacity`.
    pub fn over_pixel(&mut self, x: u32, y: u32, src: Rgba8, opacity: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.idx(x, y);
        let dst = [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ];
        let out = over(dst, src, opacity);
        self.data[i..i + 4].copy_from_slice(&out);
    }

    /// Composite `src` with its top-left corner at `(x, y)`. With `mirror`
    /// the destination draw is flipped about the surface's vertical
    /// centerline; the source pixels are untouched, so anything drawn after
    /// this call lands unmirrored.
    pub fn blit(
        &mut self,
        src: &Raster,
        x: u32,
        y: u32,
        opacity: f32,
        mirror: bool,
    ) -> TuftResult<()> {
        if src.data.len() != (src.width as usize) * (src.height as usize) * 4 {
            return Err(TuftError::render("blit source buffer size mismatch"));
        }
        for row in 0..src.height {
            let dy = y + row;
            if dy >= self.height {
                break;
            }
            for col in 0..src.width {
                let dx = if mirror {
                    let straight = x + col;
                    if straight >= self.width {
                        continue;
                    }
                    self.width - 1 - straight
                } else {
                    x + col
                };
                if dx >= self.width {
                    continue;
                }
                let s = ((row as usize) * (src.width as usize) + (col as usize)) * 4;
                let px = [src.data[s], src.data[s + 1], src.data[s + 2], src.data[s + 3]];
                self.over_pixel(dx, dy, px, opacity);
            }
        }
        Ok(())
    }

    /// Source-over a solid rectangle; out-of-bounds spans are clipped.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba8, opacity: f32) {
        for dy in y..y.saturating_add(h).min(self.height) {
            for dx in x..x.saturating_add(w).min(self.width) {
                self.over_pixel(dx, dy, color, opacity);
            }
        }
    }
}

/// Straight-alpha source-over. `opacity` further scales the source alpha.
pub fn over(dst: Rgba8, src: Rgba8, opacity: f32) -> Rgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    let sa = ((f32::from(src[3]) * opacity).round() as u32).min(255);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return [src[0], src[1], src[2], 255];
    }

    let da = u32::from(dst[3]);
    let da_scaled = (da * (255 - sa) + 127) / 255;
    let out_a = sa + da_scaled;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * sa + u32::from(dst[i]) * da_scaled;
        out[i] = ((num + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    out
}
