//! SVG input rasterization and SVG output wrapping.
//!
//! SVG sources are rendered at their intrinsic size with resvg. SVG output is
//! a raster PNG embedded in an `<image>` element, which keeps the pixel
//! dimensions of the source and re-renders identically.

use crate::{ImageError, MAX_DIMENSION, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

/// Largest RGBA canvas rendered, equal to the image crate's default
/// decoder allocation limit.
const MAX_CANVAS_BYTES: u64 = 512 * 1024 * 1024;

fn check_canvas(width: u32, height: u32) -> Result<()> {
    let bytes = u64::from(width) * u64::from(height) * 4;
    if width > MAX_DIMENSION || height > MAX_DIMENSION || bytes > MAX_CANVAS_BYTES {
        return Err(ImageError::Decode(format!(
            "SVG canvas {width}x{height} exceeds the rendering limit"
        )));
    }
    Ok(())
}

fn parse(data: &[u8]) -> Result<Tree> {
    Tree::from_data(data, &Options::default()).map_err(|e| ImageError::Svg(e.to_string()))
}

/// Intrinsic pixel size of an SVG document.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let size = parse(data).ok()?.size().to_int_size();
    Some((size.width(), size.height()))
}

/// Render an SVG document into an RGBA bitmap at its intrinsic size.
pub fn rasterize(data: &[u8]) -> Result<DynamicImage> {
    let tree = parse(data)?;
    let size = tree.size().to_int_size();
    check_canvas(size.width(), size.height())?;

    let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        ImageError::Svg(format!("Cannot allocate {}x{} canvas", size.width(), size.height()))
    })?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha
    let raw: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    RgbaImage::from_raw(size.width(), size.height(), raw)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| ImageError::Svg("Rendered buffer has the wrong size".to_string()))
}

/// Wrap PNG bytes in a standalone SVG document of the same size.
pub fn wrap_png(png: &[u8], width: u32, height: u32) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
            r#"width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<image width="{w}" height="{h}" xlink:href="data:image/png;base64,{data}"/>"#,
            "</svg>\n"
        ),
        w = width,
        h = height,
        data = STANDARD.encode(png),
    )
}
