//! Flattening of logos onto a solid background before OCR
//!
//! Transparent pixels read as black to most OCR engines, so dark text on a
//! transparent logo disappears. Logos are composited onto white first and,
//! when that reads nothing and the image carries alpha, onto black.

use crate::EnrichError;
use image::{ImageFormat, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A decoded logo ready to be flattened
#[derive(Debug, Clone)]
pub struct DecodedLogo {
    pixels: RgbaImage,
    has_alpha: bool,
}

impl DecodedLogo {
    pub fn decode(bytes: &[u8]) -> Result<Self, EnrichError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| EnrichError::Ocr(format!("unreadable image: {}", e)))?;

        Ok(Self {
            has_alpha: image.color().has_alpha(),
            pixels: image.to_rgba8(),
        })
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Alpha-blends the logo over `background` and encodes the result as PNG
    pub fn on_background(&self, background: Rgb<u8>) -> Result<Vec<u8>, EnrichError> {
        let (width, height) = self.pixels.dimensions();
        let flattened = RgbImage::from_fn(width, height, |x, y| {
            let [r, g, b, a] = self.pixels.get_pixel(x, y).0;
            Rgb([
                blend(r, background[0], a),
                blend(g, background[1], a),
                blend(b, background[2], a),
            ])
        });

        let mut png = Vec::new();
        flattened
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| EnrichError::Ocr(format!("PNG encoding failed: {}", e)))?;
        Ok(png)
    }
}

fn blend(channel: u8, background: u8, alpha: u8) -> u8 {
    let alpha = u32::from(alpha);
    let mixed = u32::from(channel) * alpha + u32::from(background) * (255 - alpha);
    ((mixed + 127) / 255) as u8
}
