//! Unit tests for icon validation and SVG rasterization.

use std::io::Cursor;

use linkshelf::services::image_validation::{
    is_svg, prepare_icon, rasterize_svg, validate_raster, MAX_RASTER_SIDE,
};
use linkshelf::types::errors::ImageError;

/// Encodes a solid `width` x `height` PNG.
fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="16"><rect width="32" height="16" fill="blue"/></svg>"#;

#[test]
fn test_validate_raster_reports_dimensions() {
    assert_eq!(validate_raster(&png_bytes(16, 8)).unwrap(), (16, 8));
}

#[test]
fn test_garbage_is_undecodable() {
    assert!(matches!(
        validate_raster(b"<html>not an icon</html>"),
        Err(ImageError::Undecodable(_))
    ));
    assert!(matches!(
        prepare_icon(Some("image/png"), "https://example.com/favicon.ico", b""),
        Err(ImageError::Undecodable(_))
    ));
}

/// Raster icons are stored exactly as downloaded.
#[test]
fn test_prepare_raster_keeps_bytes() {
    let png = png_bytes(32, 32);
    let prepared = prepare_icon(Some("image/png"), "https://example.com/icon.png", &png).unwrap();
    assert_eq!(prepared, png);
}

#[test]
fn test_svg_detection() {
    assert!(is_svg(Some("image/svg+xml; charset=utf-8"), "", b""));
    assert!(is_svg(None, "https://example.com/logo.SVG?v=2", b""));
    assert!(is_svg(None, "", b"  <svg xmlns=\"http://www.w3.org/2000/svg\"/>"));
    assert!(is_svg(None, "", b"<?xml version=\"1.0\"?>\n<svg/>"));
    assert!(!is_svg(Some("image/png"), "https://example.com/icon.png", &png_bytes(1, 1)));
}

/// SVG icons come out as PNG with the document's size.
#[test]
fn test_rasterize_svg_to_png() {
    let png = rasterize_svg(SVG.as_bytes()).unwrap();
    assert_eq!(validate_raster(&png).unwrap(), (32, 16));

    let prepared = prepare_icon(Some("image/svg+xml"), "", SVG.as_bytes()).unwrap();
    assert_eq!(image::guess_format(&prepared).unwrap(), image::ImageFormat::Png);
}

#[test]
fn test_large_svg_is_scaled_down() {
    let big = r#"<svg xmlns="http://www.w3.org/2000/svg" width="2048" height="1024"><circle cx="1024" cy="512" r="500"/></svg>"#;
    let png = rasterize_svg(big.as_bytes()).unwrap();
    let (w, h) = validate_raster(&png).unwrap();
    assert_eq!(w, MAX_RASTER_SIDE);
    assert_eq!(h, MAX_RASTER_SIDE / 2);
}

#[test]
fn test_broken_svg_fails() {
    assert!(matches!(
        rasterize_svg(b"<svg><unclosed"),
        Err(ImageError::Rasterize(_))
    ));
}
