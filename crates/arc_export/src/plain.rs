//! Plain 8-bit RGB export, no identity channels.

use crate::ExportError;
use arc_renderer::Framebuffer;
use image::{Rgb, RgbImage};
use std::path::Path;

/// Gamma correction (gamma = 2.0).
#[inline]
fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

fn to_byte(linear: f32) -> u8 {
    (255.0 * linear_to_gamma(linear).clamp(0.0, 1.0)) as u8
}

/// Write the beauty channel as an 8-bit RGB image; format follows the path
/// extension.
pub fn write_png(path: &Path, framebuffer: &Framebuffer) -> Result<(), ExportError> {
    let mut image = RgbImage::new(framebuffer.width(), framebuffer.height());

    for y in 0..framebuffer.height() {
        for x in 0..framebuffer.width() {
            let pixel = framebuffer.pixel(x, y);
            image.put_pixel(
                x,
                y,
                Rgb([
                    to_byte(pixel.rgb.x),
                    to_byte(pixel.rgb.y),
                    to_byte(pixel.rgb.z),
                ]),
            );
        }
    }

    image.save(path)?;
    log::info!("wrote {}", path.display());
    Ok(())
}
