//! Asset decoding and loading for the viewer.
//! Meshes come from OBJ, textures from DDS (BC1/BC2/BC3/RGBA8) or PNG.
//! `loader` runs the decodes in parallel and tracks per-class status.

pub mod dds;
pub mod io;
pub mod loader;
pub mod mesh;
pub mod obj;
pub mod status;
pub mod texture;

pub use loader::{AssetClass, AssetEvent, ModelAssets, ModelSource, load_model};
pub use status::{ArrayAsset, AssetStatus, LoadableAsset};
