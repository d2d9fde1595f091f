use tuftline::{
    ColorLayer, EditView, PaletteColor, ProcessedResult, ProjectionView, Rgb, Store,
    YarnEstimate, render_edit_view, render_projection_view,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let navy = Rgb::from_hex("#2d469b")?;
    let sand = Rgb::from_hex("#e0c27a")?;

    let mut img = image::RgbaImage::new(64, 48);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let c = if (x / 8 + y / 8) % 2 == 0 { navy } else { sand };
        *px = image::Rgba([c.0, c.1, c.2, 255]);
    }
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;

    let mut store = Store::new();
    store.init_project(png.clone());
    store.set_processed_result(ProcessedResult {
        processed_image: png,
        palette: vec![
            PaletteColor {
                id: "navy".into(),
                rgb: navy,
                hex: navy.to_hex(),
                pixel_count: 1536,
                name: "Navy".into(),
            },
            PaletteColor {
                id: "sand".into(),
                rgb: sand,
                hex: sand.to_hex(),
                pixel_count: 1536,
                name: "Sand".into(),
            },
        ],
        layers: vec![ColorLayer {
            color_id: "navy".into(),
            bitmap: vec![0],
            outline_path: None,
        }],
        yarn_estimates: vec![YarnEstimate {
            color_id: "navy".into(),
            area: 72.0,
            estimated_yards: 30.0,
            percent_coverage: 50.0,
        }],
        outline_svg: None,
    });
    store.set_solo_color(Some("navy"));

    let project = store.project().expect("project");
    let edit = render_edit_view(
        project,
        store.ui(),
        EditView {
            container_width: 480,
            container_height: 360,
            show_raw: false,
        },
    )?;
    let projection = render_projection_view(
        project,
        store.ui(),
        ProjectionView {
            container_width: 640,
            container_height: 480,
            show_raw: false,
            pattern_opacity: 0.9,
            mirror: true,
            show_guides: true,
        },
    )?;

    for (name, surface) in [("edit_view.png", edit), ("projection_view.png", projection)] {
        let img = image::RgbaImage::from_raw(surface.width, surface.height, surface.data)
            .expect("surface buffer");
        img.save(name)?;
        println!("wrote {name}");
    }
    Ok(())
}
