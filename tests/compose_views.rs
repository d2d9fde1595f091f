use tuftline::{
    ColorLayer, EditView, PaletteColor, ProcessedResult, ProjectionView, Rgb, Store, Surface,
    YarnEstimate, render_edit_view, render_projection_view,
};

const BLUE: Rgb = Rgb(45, 70, 155);
const RED: Rgb = Rgb(210, 60, 45);

fn checker_png(width: u32, height: u32) -> Vec<u8> {
    let mut img = image::RgbaImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let c = if (x + y) % 2 == 0 { BLUE } else { RED };
        *px = image::Rgba([c.0, c.1, c.2, 255]);
    }
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn outline_markup(width: u32, height: u32) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" "#,
            r#"width="{w}" height="{h}">"#,
            r##"<path d="M1,1 L{iw},1 L{iw},{ih} L1,{ih} Z" fill="none" stroke="#000000" "##,
            r#"stroke-width="1.5" stroke-linejoin="round" stroke-linecap="round"/></svg>"#
        ),
        w = width,
        h = height,
        iw = width - 1,
        ih = height - 1,
    )
}

/// A store holding a processed two-color project, built entirely through the
/// store's own mutation surface.
fn processed_store() -> Store {
    let mut store = Store::new();
    store.init_project(checker_png(8, 4));
    store.set_processed_result(ProcessedResult {
        processed_image: checker_png(8, 4),
        palette: vec![
            PaletteColor {
                id: "c-blue".into(),
                rgb: BLUE,
                hex: BLUE.to_hex(),
                pixel_count: 16,
                name: "Navy".into(),
            },
            PaletteColor {
                id: "c-red".into(),
                rgb: RED,
                hex: RED.to_hex(),
                pixel_count: 16,
                name: "Brick".into(),
            },
        ],
        layers: vec![ColorLayer {
            color_id: "c-blue".into(),
            bitmap: checker_png(8, 4),
            outline_path: None,
        }],
        yarn_estimates: vec![YarnEstimate {
            color_id: "c-blue".into(),
            area: 8.0,
            estimated_yards: 3.0,
            percent_coverage: 50.0,
        }],
        outline_svg: Some(outline_markup(8, 4)),
    });
    store
}

fn edit_view() -> EditView {
    EditView {
        container_width: 64,
        container_height: 48,
        show_raw: false,
    }
}

fn projection_view() -> ProjectionView {
    ProjectionView {
        container_width: 128,
        container_height: 96,
        show_raw: false,
        pattern_opacity: 1.0,
        mirror: false,
        show_guides: false,
    }
}

fn visible_pixels_matching(surface: &Surface, target: Rgb, tolerance: u8) -> usize {
    surface
        .data
        .chunks_exact(4)
        .filter(|px| px[3] > 0 && tuftline::matches(Rgb(px[0], px[1], px[2]), target, tolerance))
        .count()
}

#[test]
fn rendering_the_same_inputs_twice_is_byte_identical() {
    let store = processed_store();
    let project = store.project().unwrap();

    let a = render_edit_view(project, store.ui(), edit_view()).unwrap();
    let b = render_edit_view(project, store.ui(), edit_view()).unwrap();
    assert_eq!(a, b);

    let view = ProjectionView {
        mirror: true,
        show_guides: true,
        pattern_opacity: 0.7,
        ..projection_view()
    };
    let a = render_projection_view(project, store.ui(), view).unwrap();
    let b = render_projection_view(project, store.ui(), view).unwrap();
    assert_eq!(a, b);
}

#[test]
fn hiding_a_color_masks_it_and_unhiding_restores_it() {
    let mut store = processed_store();
    let before = render_edit_view(store.project().unwrap(), store.ui(), edit_view()).unwrap();
    assert!(visible_pixels_matching(&before, BLUE, tuftline::MASK_TOLERANCE) > 0);

    store.toggle_hidden("c-blue");
    let hidden = render_edit_view(store.project().unwrap(), store.ui(), edit_view()).unwrap();
    assert_eq!(
        visible_pixels_matching(&hidden, BLUE, tuftline::MASK_TOLERANCE),
        0
    );
    // The other color is untouched in hue and alpha.
    assert_eq!(
        visible_pixels_matching(&hidden, RED, tuftline::MASK_TOLERANCE),
        visible_pixels_matching(&before, RED, tuftline::MASK_TOLERANCE)
    );

    store.toggle_hidden("c-blue");
    let restored = render_edit_view(store.project().unwrap(), store.ui(), edit_view()).unwrap();
    assert_eq!(restored, before);
}

#[test]
fn solo_dims_other_colors_without_shifting_their_hue() {
    let mut store = processed_store();
    store.set_solo_color(Some("c-blue"));

    let surface =
        render_projection_view(store.project().unwrap(), store.ui(), projection_view()).unwrap();

    // Solo pixels keep their exact color; the rest are scaled to 10%.
    let dimmed_red = Rgb(21, 6, 5);
    assert!(visible_pixels_matching(&surface, BLUE, 0) > 0);
    assert!(visible_pixels_matching(&surface, dimmed_red, 1) > 0);
    assert_eq!(visible_pixels_matching(&surface, RED, 0), 0);
}

#[test]
fn solo_and_mask_agree_on_untargeted_pixels() {
    // Masking BLUE (edit) and soloing RED (projection) must both leave RED
    // pixels' hue intact; the modes differ only in what happens to BLUE.
    let mut store = processed_store();
    store.toggle_hidden("c-blue");
    let masked = render_edit_view(store.project().unwrap(), store.ui(), edit_view()).unwrap();

    store.toggle_hidden("c-blue");
    store.set_solo_color(Some("c-red"));
    let soloed = render_projection_view(
        store.project().unwrap(),
        store.ui(),
        ProjectionView {
            container_width: 64,
            container_height: 48,
            ..projection_view()
        },
    )
    .unwrap();

    assert!(visible_pixels_matching(&masked, RED, 0) > 0);
    assert_eq!(
        visible_pixels_matching(&masked, RED, 0),
        visible_pixels_matching(&soloed, RED, 0)
    );
    // Masked blue is transparent; soloed blue is dimmed but still opaque.
    assert_eq!(visible_pixels_matching(&masked, BLUE, 0), 0);
    assert!(visible_pixels_matching(&soloed, Rgb(5, 7, 16), 1) > 0);
}

#[test]
fn raw_mode_short_circuits_masking_and_outline() {
    let mut store = processed_store();
    store.toggle_hidden("c-blue");
    store.set_show_outline(true);

    let raw_view = EditView {
        show_raw: true,
        ..edit_view()
    };
    let surface = render_edit_view(store.project().unwrap(), store.ui(), raw_view).unwrap();
    // Hidden set is ignored in raw mode: blue photo pixels stay visible.
    assert!(visible_pixels_matching(&surface, BLUE, tuftline::MASK_TOLERANCE) > 0);
}

#[test]
fn outline_overlay_draws_on_top_when_enabled() {
    let mut store = processed_store();
    let plain = render_edit_view(store.project().unwrap(), store.ui(), edit_view()).unwrap();

    store.set_show_outline(true);
    let outlined = render_edit_view(store.project().unwrap(), store.ui(), edit_view()).unwrap();
    assert_ne!(plain, outlined);

    // Projection forces the stroke to the high-contrast color. A wide stroke
    // guarantees fully-covered pixels even at this tiny draw size.
    store.set_outline_width(3.0);
    let projected = render_projection_view(
        store.project().unwrap(),
        store.ui(),
        ProjectionView {
            container_width: 64,
            container_height: 48,
            ..projection_view()
        },
    )
    .unwrap();
    assert!(visible_pixels_matching(&projected, Rgb(255, 255, 255), 4) > 0);
}

#[test]
fn mirror_flips_the_pattern_but_not_the_guides() {
    let store = processed_store();
    let project = store.project().unwrap();

    let plain = render_projection_view(project, store.ui(), projection_view()).unwrap();
    let mirrored = render_projection_view(
        project,
        store.ui(),
        ProjectionView {
            mirror: true,
            ..projection_view()
        },
    )
    .unwrap();

    // Pattern pixels reflect about the vertical centerline.
    let w = plain.width;
    for y in 0..plain.height {
        for x in 0..w {
            assert_eq!(plain.pixel(x, y), mirrored.pixel(w - 1 - x, y));
        }
    }

    // Guides land identically whether or not the pattern is mirrored. The
    // pattern layer is blanked so the comparison sees only the guides.
    let guides_plain = render_projection_view(
        project,
        store.ui(),
        ProjectionView {
            show_guides: true,
            pattern_opacity: 0.0,
            ..projection_view()
        },
    )
    .unwrap();
    let guides_mirrored = render_projection_view(
        project,
        store.ui(),
        ProjectionView {
            show_guides: true,
            pattern_opacity: 0.0,
            mirror: true,
            ..projection_view()
        },
    )
    .unwrap();
    assert_eq!(guides_plain, guides_mirrored);
}

#[test]
fn guides_use_the_fixed_accent_color() {
    let store = processed_store();
    let surface = render_projection_view(
        store.project().unwrap(),
        store.ui(),
        ProjectionView {
            show_guides: true,
            pattern_opacity: 0.0,
            ..projection_view()
        },
    )
    .unwrap();

    // With the pattern fully transparent, guide pixels carry the accent hue.
    let accent = Rgb(255, 64, 129);
    assert!(visible_pixels_matching(&surface, accent, 8) > 0);
    // Crosshair passes through the center row.
    let center = surface.pixel(surface.width / 2, surface.height / 2);
    assert!(center[3] > 0);
}

#[test]
fn pattern_opacity_scales_the_composite_alpha() {
    let store = processed_store();
    let surface = render_projection_view(
        store.project().unwrap(),
        store.ui(),
        ProjectionView {
            pattern_opacity: 0.5,
            ..projection_view()
        },
    )
    .unwrap();

    let max_alpha = surface.data.chunks_exact(4).map(|px| px[3]).max().unwrap();
    assert!(max_alpha > 0 && max_alpha < 255);
}
