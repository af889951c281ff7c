//! Texture data and decoding: PNG through `image`, DDS through `dds`.

use std::path::Path;

use anyhow::{Context, Result, bail, ensure};

/// Texture data in CPU-friendly format before GPU upload. Only the top mip
/// level is kept.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texel layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    /// DXT1: 8 bytes per 4x4 block.
    Bc1,
    /// DXT3: 16 bytes per 4x4 block.
    Bc2,
    /// DXT5: 16 bytes per 4x4 block.
    Bc3,
}

impl TextureFormat {
    /// Block-compressed formats store 4x4 texel blocks.
    pub fn is_compressed(self) -> bool {
        !matches!(self, TextureFormat::Rgba8)
    }

    /// Bytes per texel (uncompressed) or per 4x4 block (compressed).
    pub fn unit_bytes(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Bc1 => 8,
            TextureFormat::Bc2 | TextureFormat::Bc3 => 16,
        }
    }

    /// Size in bytes of one `width` x `height` image.
    pub fn level_size(self, width: u32, height: u32) -> usize {
        if self.is_compressed() {
            let bw = width.div_ceil(4).max(1) as usize;
            let bh = height.div_ceil(4).max(1) as usize;
            bw * bh * self.unit_bytes() as usize
        } else {
            width as usize * height as usize * self.unit_bytes() as usize
        }
    }
}

impl TextureData {
    /// Wrap already-decoded texels, checking the byte count.
    pub fn new(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Result<Self> {
        ensure!(width > 0 && height > 0, "Texture has zero extent");
        let expected = format.level_size(width, height);
        ensure!(
            data.len() == expected,
            "Texture data is {} bytes, {:?} {}x{} needs {}",
            data.len(),
            format,
            width,
            height,
            expected
        );
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Decode a texture file's bytes, choosing the decoder from `path`'s
    /// extension.
    pub fn decode(path: &Path, bytes: &[u8]) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "dds" => crate::dds::decode_dds(bytes)
                .with_context(|| format!("Failed to decode DDS {}", path.display())),
            "png" => Self::decode_png(bytes)
                .with_context(|| format!("Failed to decode PNG {}", path.display())),
            other => bail!("Unsupported texture format '{other}' for {}", path.display()),
        }
    }

    /// Decode PNG bytes into RGBA8.
    pub fn decode_png(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded PNG {}x{}", width, height);
        Self::new(width, height, TextureFormat::Rgba8, rgba.into_raw())
    }

    /// Checkerboard stand-in used when a real texture cannot be shown.
    pub fn checkerboard(size: u32) -> Self {
        let size = size.max(1);
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let shade = if ((x / 8) + (y / 8)) % 2 == 0 { 255 } else { 128 };
                data.extend_from_slice(&[shade, shade, shade, 255]);
            }
        }
        Self {
            data,
            width: size,
            height: size,
            format: TextureFormat::Rgba8,
        }
    }

    /// Check that the byte count matches the declared format and extent.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == self.format.level_size(self.width, self.height)
    }
}
