//! Icon validation and SVG rasterization.
//!
//! Raster icons are accepted as downloaded once they decode with non-zero
//! dimensions. SVG icons are rendered to PNG.

use image::GenericImageView;

use crate::types::errors::ImageError;

/// Longest side of a rasterized SVG icon, in pixels.
pub const MAX_RASTER_SIDE: u32 = 512;

/// SVG by content type, by a `.svg` path, or by sniffing the document start.
pub fn is_svg(content_type: Option<&str>, url: &str, body: &[u8]) -> bool {
    if content_type.map_or(false, |ct| ct.to_ascii_lowercase().contains("image/svg+xml")) {
        return true;
    }
    let lower = url.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    if path.ends_with(".svg") {
        return true;
    }
    looks_like_svg_document(body)
}

fn looks_like_svg_document(body: &[u8]) -> bool {
    let mut bytes = body.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(body);
    while let Some((first, rest)) = bytes.split_first() {
        if !first.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    if bytes.starts_with(b"<svg") {
        return true;
    }
    bytes.starts_with(b"<?xml") && bytes.windows(4).any(|window| window == b"<svg")
}

/// Decodes a raster image and checks its dimensions. Returns (width, height).
pub fn validate_raster(body: &[u8]) -> Result<(u32, u32), ImageError> {
    let decoded =
        image::load_from_memory(body).map_err(|e| ImageError::Undecodable(e.to_string()))?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::BadDimensions { width, height });
    }
    Ok((width, height))
}

/// Renders an SVG document to PNG, scaled down to fit [`MAX_RASTER_SIDE`].
pub fn rasterize_svg(body: &[u8]) -> Result<Vec<u8>, ImageError> {
    let options = resvg::usvg::Options::default();
    let tree = resvg::usvg::Tree::from_data(body, &options)
        .map_err(|e| ImageError::Rasterize(e.to_string()))?;

    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    if width == 0 || height == 0 {
        return Err(ImageError::BadDimensions { width, height });
    }

    let longest = width.max(height);
    let scale = if longest > MAX_RASTER_SIDE {
        MAX_RASTER_SIDE as f32 / longest as f32
    } else {
        1.0
    };
    let target_w = ((width as f32 * scale).ceil() as u32).max(1);
    let target_h = ((height as f32 * scale).ceil() as u32).max(1);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(target_w, target_h).ok_or(
        ImageError::BadDimensions {
            width: target_w,
            height: target_h,
        },
    )?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    pixmap
        .encode_png()
        .map_err(|e| ImageError::Rasterize(e.to_string()))
}

/// Turns downloaded icon bytes into storable image bytes.
pub fn prepare_icon(content_type: Option<&str>, url: &str, body: &[u8]) -> Result<Vec<u8>, ImageError> {
    if body.is_empty() {
        return Err(ImageError::Undecodable("empty body".to_string()));
    }
    if is_svg(content_type, url, body) {
        return rasterize_svg(body);
    }
    validate_raster(body)?;
    Ok(body.to_vec())
}
