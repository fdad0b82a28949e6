use std::path::Path;

use anyhow::Context as _;
use image::{ImageFormat, Rgba, RgbaImage};

use super::Surface;
use crate::coords::Rect;
use crate::paint::Color;

/// RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSurface {
    image: RgbaImage,
}

impl PixelSurface {
    /// A transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { image: RgbaImage::new(width, height) }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width(), self.height())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).map(|p| Color::from_array(p.0))
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn encode_png(&self) -> anyhow::Result<Vec<u8>> {
        let mut out = std::io::Cursor::new(Vec::new());
        self.image
            .write_to(&mut out, ImageFormat::Png)
            .context("encode surface as PNG")?;
        Ok(out.into_inner())
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("write PNG to {}", path.display()))
    }
}

impl Default for PixelSurface {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Surface for PixelSurface {
    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(r) = self.bounds().intersect(rect) else {
            return;
        };
        let px = Rgba(color.to_array());
        for y in r.y..r.y + r.h {
            for x in r.x..r.x + r.w {
                self.image.put_pixel(x, y, px);
            }
        }
    }
}
