//! The compositor: pixel-exact rendering of a project plus overlay state
//! onto a target surface.
//!
//! Both surfaces share one pipeline — source selection, fit & scale,
//! visibility masking, outline overlay — applied onto an intermediate
//! unmirrored buffer sized to the scaled image, then blitted to the visible
//! surface. The projection surface adds pattern opacity, an optional
//! horizontal mirror (applied to the destination draw, so guides drawn
//! afterwards are unaffected), and fixed alignment guides.

use crate::{
    classify::{self, Rule},
    color::{MASK_TOLERANCE, Rgb},
    error::{TuftError, TuftResult},
    model::Project,
    outline,
    raster::{self, Raster},
    store::UiState,
    surface::{Rgba8, Surface},
};

/// Padding between the container edge and the drawn image, both views.
pub const CONTAINER_PADDING: u32 = 16;

/// Stroke color forced onto the outline on the projection surface, where the
/// pattern is dimmed/washed by the projector and the service's black stroke
/// would vanish.
pub const PROJECTION_STROKE: Rgb = Rgb(255, 255, 255);

/// Accent color and opacity for the alignment guides.
pub const GUIDE_COLOR: Rgba8 = [255, 64, 129, 255];
pub const GUIDE_OPACITY: f32 = 0.8;
const GUIDE_THICKNESS: u32 = 2;
const GUIDE_DASH: u32 = 8;
const GUIDE_GAP: u32 = 6;
const CORNER_INSET: u32 = 24;
const CORNER_ARM: u32 = 16;

/// Where and how large the source draws inside the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest scale ≤ 1 that fits `src` inside the container minus padding,
/// aspect ratio preserved, rounded to pixel boundaries, centered.
pub fn fit_rect(
    container_width: u32,
    container_height: u32,
    src_width: u32,
    src_height: u32,
) -> TuftResult<FitRect> {
    if src_width == 0 || src_height == 0 {
        return Err(TuftError::render("source raster has zero dimension"));
    }
    let avail_w = container_width.saturating_sub(2 * CONTAINER_PADDING);
    let avail_h = container_height.saturating_sub(2 * CONTAINER_PADDING);
    if avail_w == 0 || avail_h == 0 {
        return Err(TuftError::render("container too small for padded draw"));
    }

    let scale = (f64::from(avail_w) / f64::from(src_width))
        .min(f64::from(avail_h) / f64::from(src_height))
        .min(1.0);
    let width = ((f64::from(src_width) * scale).round() as u32).max(1);
    let height = ((f64::from(src_height) * scale).round() as u32).max(1);

    Ok(FitRect {
        x: (container_width - width) / 2,
        y: (container_height - height) / 2,
        width,
        height,
    })
}

/// Inputs for the edit canvas.
#[derive(Clone, Copy, Debug)]
pub struct EditView {
    pub container_width: u32,
    pub container_height: u32,
    /// Raw/pattern toggle: raw short-circuits every stage except the scaled
    /// draw of the original photo.
    pub show_raw: bool,
}

/// Inputs for the full-screen projection canvas.
#[derive(Clone, Copy, Debug)]
pub struct ProjectionView {
    pub container_width: u32,
    pub container_height: u32,
    pub show_raw: bool,
    /// Alpha for the composed pattern layer (stages 1-4).
    pub pattern_opacity: f32,
    pub mirror: bool,
    pub show_guides: bool,
}

/// Render the edit view: hidden-color masking, outline at the user's stroke
/// width in its recorded color.
#[tracing::instrument(skip(project, ui))]
pub fn render_edit_view(
    project: &Project,
    ui: &UiState,
    view: EditView,
) -> TuftResult<Surface> {
    let pattern = compose_pattern(
        project,
        ui,
        view.container_width,
        view.container_height,
        view.show_raw,
        MaskStage::HiddenSet,
        None,
    )?;

    let mut surface = Surface::new(view.container_width, view.container_height);
    surface.blit(&pattern.layer, pattern.rect.x, pattern.rect.y, 1.0, false)?;
    Ok(surface)
}

/// Render the projection view: solo isolation, high-contrast outline,
/// caller-controlled pattern opacity, optional mirror, alignment guides.
#[tracing::instrument(skip(project, ui))]
pub fn render_projection_view(
    project: &Project,
    ui: &UiState,
    view: ProjectionView,
) -> TuftResult<Surface> {
    let pattern = compose_pattern(
        project,
        ui,
        view.container_width,
        view.container_height,
        view.show_raw,
        MaskStage::Solo,
        Some(PROJECTION_STROKE),
    )?;

    let mut surface = Surface::new(view.container_width, view.container_height);
    surface.blit(
        &pattern.layer,
        pattern.rect.x,
        pattern.rect.y,
        view.pattern_opacity,
        view.mirror,
    )?;

    // Guides go straight onto the visible surface, never mirrored.
    if view.show_guides {
        draw_guides(&mut surface);
    }
    Ok(surface)
}

enum MaskStage {
    /// Edit view: pixels of hidden palette colors become transparent.
    HiddenSet,
    /// Projection view: everything but the solo color is dimmed.
    Solo,
}

struct ComposedPattern {
    layer: Raster,
    rect: FitRect,
}

/// Stages 1-4 of the pipeline, shared by both views: produce the scaled,
/// masked, outlined pattern layer plus its placement.
fn compose_pattern(
    project: &Project,
    ui: &UiState,
    container_width: u32,
    container_height: u32,
    show_raw: bool,
    mask_stage: MaskStage,
    outline_color: Option<Rgb>,
) -> TuftResult<ComposedPattern> {
    // Stage 1: source selection. Raw mode (or a not-yet-processed project)
    // short-circuits masking and the outline overlay.
    let (bytes, raw_mode) = match (&project.processed_image, show_raw) {
        (Some(processed), false) => (processed.as_slice(), false),
        _ => (project.original_image.as_slice(), true),
    };
    let source = raster::decode(bytes)?;

    // Stage 2: fit & scale, nearest-neighbor to keep region edges discrete.
    let rect = fit_rect(container_width, container_height, source.width, source.height)?;
    let mut layer = raster::resize_nearest(&source, rect.width, rect.height)?;
    tracing::debug!(
        src_w = source.width,
        src_h = source.height,
        draw_w = rect.width,
        draw_h = rect.height,
        raw_mode,
        "composed pattern geometry"
    );

    if !raw_mode {
        // Stage 3: visibility/solo masking, only when the flag is non-default.
        match mask_stage {
            MaskStage::HiddenSet => {
                if !ui.hidden_color_ids.is_empty() {
                    // Palette order, not set order: first match wins on overlap.
                    let hidden: Vec<Rgb> = project
                        .palette
                        .iter()
                        .filter(|c| ui.hidden_color_ids.contains(&c.id))
                        .map(|c| c.rgb)
                        .collect();
                    classify::reclassify(
                        &mut layer.data,
                        &Rule::Mask { hidden: &hidden },
                        MASK_TOLERANCE,
                    )?;
                }
            }
            MaskStage::Solo => {
                if let Some(solo_id) = &ui.solo_color_id
                    && let Some(color) = project.palette_color(solo_id)
                {
                    classify::reclassify(
                        &mut layer.data,
                        &Rule::Isolate { target: color.rgb },
                        MASK_TOLERANCE,
                    )?;
                }
            }
        }

        // Stage 4: outline overlay at the same scaled geometry, full opacity,
        // smoothed (vector-derived, rasterized at the draw size).
        if ui.show_outline
            && let Some(markup) = &project.outline_svg
            && !markup.is_empty()
        {
            let restroked = outline::restroke(markup, ui.outline_width, outline_color);
            let overlay = outline::rasterize(&restroked, rect.width, rect.height)?;
            overlay_in_place(&mut layer, &overlay)?;
        }
    }

    Ok(ComposedPattern { layer, rect })
}

fn overlay_in_place(base: &mut Raster, overlay: &Raster) -> TuftResult<()> {
    if base.width != overlay.width || base.height != overlay.height {
        return Err(TuftError::render("overlay geometry mismatch"));
    }
    for (d, s) in base
        .data
        .chunks_exact_mut(4)
        .zip(overlay.data.chunks_exact(4))
    {
        let out = crate::surface::over(
            [d[0], d[1], d[2], d[3]],
            [s[0], s[1], s[2], s[3]],
            1.0,
        );
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Crosshair through the image center (dashed) and four L-shaped corner
/// markers at a fixed inset (solid), fixed accent color and opacity.
fn draw_guides(surface: &mut Surface) {
    let w = surface.width;
    let h = surface.height;
    if w < 2 * CORNER_INSET || h < 2 * CORNER_INSET {
        return;
    }

    let cx = w / 2;
    let cy = h / 2;

    // Dashed crosshair.
    let mut x = 0;
    while x < w {
        let run = GUIDE_DASH.min(w - x);
        surface.fill_rect(
            x,
            cy.saturating_sub(GUIDE_THICKNESS / 2),
            run,
            GUIDE_THICKNESS,
            GUIDE_COLOR,
            GUIDE_OPACITY,
        );
        x += GUIDE_DASH + GUIDE_GAP;
    }
    let mut y = 0;
    while y < h {
        let run = GUIDE_DASH.min(h - y);
        surface.fill_rect(
            cx.saturating_sub(GUIDE_THICKNESS / 2),
            y,
            GUIDE_THICKNESS,
            run,
            GUIDE_COLOR,
            GUIDE_OPACITY,
        );
        y += GUIDE_DASH + GUIDE_GAP;
    }

    // Solid corner Ls.
    let corners = [
        (CORNER_INSET, CORNER_INSET, false, false),
        (w - CORNER_INSET, CORNER_INSET, true, false),
        (CORNER_INSET, h - CORNER_INSET, false, true),
        (w - CORNER_INSET, h - CORNER_INSET, true, true),
    ];
    for (x, y, flip_x, flip_y) in corners {
        let hx = if flip_x { x - CORNER_ARM } else { x };
        let vy = if flip_y { y - CORNER_ARM } else { y };
        let tx = if flip_x { x - GUIDE_THICKNESS } else { x };
        let ty = if flip_y { y - GUIDE_THICKNESS } else { y };
        surface.fill_rect(hx, ty, CORNER_ARM, GUIDE_THICKNESS, GUIDE_COLOR, GUIDE_OPACITY);
        surface.fill_rect(tx, vy, GUIDE_THICKNESS, CORNER_ARM, GUIDE_COLOR, GUIDE_OPACITY);
    }
}

/// Idle-hide helper for the projection view's transient overlay controls.
/// Interaction plumbing, not part of the rendering contract: the caller
/// feeds it interaction timestamps and polls visibility.
#[derive(Clone, Copy, Debug)]
pub struct OverlayAutoHide {
    idle_after: std::time::Duration,
    last_interaction: std::time::Instant,
}

impl OverlayAutoHide {
    pub const DEFAULT_IDLE: std::time::Duration = std::time::Duration::from_secs(3);

    pub fn new(now: std::time::Instant, idle_after: std::time::Duration) -> Self {
        Self {
            idle_after,
            last_interaction: now,
        }
    }

    /// Any interaction resets the idle timer.
    pub fn interact(&mut self, now: std::time::Instant) {
        self.last_interaction = now;
    }

    pub fn visible(&self, now: std::time::Instant) -> bool {
        now.duration_since(self.last_interaction) < self.idle_after
    }
}
