//! Common utilities shared across WMS and tile handlers.

use axum::{
    http::{header, StatusCode},
    response::Response,
};

use wms_common::WmsError;
use wms_protocol::exception_for;

// ============================================================================
// Exception Helpers
// ============================================================================

/// Generate a WMS-formatted exception response
pub fn wms_exception(code: &str, msg: &str, status: StatusCode) -> Response {
    let xml = wms_protocol::wms_exception(code, msg);
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/xml")
        .body(xml.into())
        .unwrap()
}

/// Exception response for a service error, using its OGC exception code
/// and mapped HTTP status.
pub fn exception_response(error: &WmsError) -> Response {
    let status = StatusCode::from_u16(error.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/xml")
        .body(exception_for(error).into())
        .unwrap()
}

// ============================================================================
// Image Format Conversion
// ============================================================================

/// Default JPEG quality (0-100). Can be overridden via environment variable.
const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Convert PNG image data to JPEG format.
///
/// Uses quality level from JPEG_QUALITY environment variable, defaulting to 90.
/// JPEG has no alpha channel, so transparent pixels are composited onto a
/// white background.
pub fn convert_png_to_jpeg(png_data: &[u8]) -> Result<Vec<u8>, String> {
    use image::{ImageFormat, Rgb, RgbImage, Rgba};
    use std::io::Cursor;

    let quality = std::env::var("JPEG_QUALITY")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(DEFAULT_JPEG_QUALITY)
        .min(100);

    let img = image::load_from_memory_with_format(png_data, ImageFormat::Png)
        .map_err(|e| format!("Failed to decode PNG: {}", e))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        rgb.put_pixel(
            x,
            y,
            Rgb([
                (r as f32 * alpha + 255.0 * (1.0 - alpha)) as u8,
                (g as f32 * alpha + 255.0 * (1.0 - alpha)) as u8,
                (b as f32 * alpha + 255.0 * (1.0 - alpha)) as u8,
            ]),
        );
    }

    let mut jpeg_data = Vec::new();
    let mut cursor = Cursor::new(&mut jpeg_data);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode(rgb.as_raw(), width, height, image::ColorType::Rgb8)
        .map_err(|e| format!("Failed to encode JPEG: {}", e))?;

    Ok(jpeg_data)
}

// ============================================================================
// Tests
// ============================================================================
