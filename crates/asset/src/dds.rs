//! DDS container decoding. Block-compressed payloads are passed through
//! untouched for direct GPU upload.

use std::io::Cursor;

use anyhow::{Context, Result, anyhow, ensure};
use ddsfile::{D3DFormat, Dds, DxgiFormat};

use crate::texture::{TextureData, TextureFormat};

pub fn decode_dds(bytes: &[u8]) -> Result<TextureData> {
    let dds = Dds::read(&mut Cursor::new(bytes)).context("Malformed DDS header")?;
    let format = texel_format(&dds)?;
    let (width, height) = (dds.get_width(), dds.get_height());

    let layer = dds.get_data(0).context("DDS has no image data")?;
    let top = format.level_size(width, height);
    ensure!(
        layer.len() >= top,
        "DDS data truncated: {} bytes, top level needs {}",
        layer.len(),
        top
    );

    log::debug!(
        "Decoded DDS {}x{} {:?} ({} mip levels, keeping 1)",
        width,
        height,
        format,
        dds.get_num_mipmap_levels()
    );
    TextureData::new(width, height, format, layer[..top].to_vec())
}

fn texel_format(dds: &Dds) -> Result<TextureFormat> {
    if let Some(dxgi) = dds.get_dxgi_format() {
        return match dxgi {
            DxgiFormat::BC1_UNorm | DxgiFormat::BC1_UNorm_sRGB => Ok(TextureFormat::Bc1),
            DxgiFormat::BC2_UNorm | DxgiFormat::BC2_UNorm_sRGB => Ok(TextureFormat::Bc2),
            DxgiFormat::BC3_UNorm | DxgiFormat::BC3_UNorm_sRGB => Ok(TextureFormat::Bc3),
            DxgiFormat::R8G8B8A8_UNorm | DxgiFormat::R8G8B8A8_UNorm_sRGB => {
                Ok(TextureFormat::Rgba8)
            }
            other => Err(anyhow!("Unsupported DXGI format {other:?}")),
        };
    }
    match dds.get_d3d_format() {
        Some(D3DFormat::DXT1) => Ok(TextureFormat::Bc1),
        Some(D3DFormat::DXT2 | D3DFormat::DXT3) => Ok(TextureFormat::Bc2),
        Some(D3DFormat::DXT4 | D3DFormat::DXT5) => Ok(TextureFormat::Bc3),
        Some(D3DFormat::A8B8G8R8) => Ok(TextureFormat::Rgba8),
        other => Err(anyhow!("Unsupported D3D format {other:?}")),
    }
}
