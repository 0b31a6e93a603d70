//! Palette reduction and the 1-bit BMP encoding the display reads.
//!
//! The plotting backend and the `image` encoders only produce 8-bit-or-deeper
//! output, so the chart is reduced here: luma, Floyd–Steinberg dither to pure
//! black/white, then packed one bit per pixel.

use image::{
    DynamicImage, GrayImage, RgbImage,
    imageops::{self, BiLevel},
};

pub const BITMAP_CONTENT_TYPE: &str = "image/bmp";

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
const PALETTE_LEN: u32 = 2 * 4;
/// 100 DPI expressed in pixels per metre.
const PIXELS_PER_METRE: i32 = 3937;

/// An encoded 1-bit-per-pixel BMP image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl Bitmap {
    pub fn content_type(&self) -> &'static str {
        BITMAP_CONTENT_TYPE
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reduce a full-colour render to pure black and white.
pub fn to_monochrome(image: RgbImage) -> GrayImage {
    let mut gray = DynamicImage::ImageRgb8(image).into_luma8();
    imageops::dither(&mut gray, &BiLevel);
    gray
}

/// Pack a black/white image as a bottom-up, uncompressed 1-bit BMP with a
/// two-entry palette (index 0 black, index 1 white). Luma of 128 and above
/// counts as white.
pub fn encode_monochrome(image: &GrayImage) -> Bitmap {
    let (width, height) = image.dimensions();
    let stride = row_stride(width);
    let pixel_bytes = stride * height;
    let offset = FILE_HEADER_LEN + INFO_HEADER_LEN + PALETTE_LEN;
    let file_len = offset + pixel_bytes;

    let mut out = Vec::with_capacity(file_len as usize);

    // BITMAPFILEHEADER
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&file_len.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&offset.to_le_bytes());

    // BITMAPINFOHEADER, positive height = bottom-up rows
    out.extend_from_slice(&INFO_HEADER_LEN.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&pixel_bytes.to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METRE.to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METRE.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());

    // palette, BGRX
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(&[255, 255, 255, 0]);

    let mut row = vec![0u8; stride as usize];
    for y in (0..height).rev() {
        row.fill(0);
        for x in 0..width {
            if image.get_pixel(x, y).0[0] >= 128 {
                row[(x / 8) as usize] |= 0x80 >> (x % 8);
            }
        }
        out.extend_from_slice(&row);
    }

    Bitmap { width, height, bytes: out }
}

/// Bytes per row: one bit per pixel, padded to a 4-byte boundary.
fn row_stride(width: u32) -> u32 {
    width.div_ceil(32) * 4
}
