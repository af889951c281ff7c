//! Parallel loading of a model description: one mesh, a primary texture,
//! optional secondary textures, drawing overlays and a cleaner texture.
//!
//! Every file is read as a task on a shared tokio runtime and decoded on its
//! blocking pool. Results travel back over a channel and are applied by
//! [`ModelAssets::poll`] on the caller's thread, so status changes and
//! observers never run concurrently.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result, bail};
use tokio::runtime::Runtime;

use crate::{
    io::read_with_progress,
    mesh::MeshData,
    obj::load_obj_from_bytes,
    status::{ArrayAsset, AssetStatus, LoadableAsset},
    texture::TextureData,
};

/// What to load. `textures[0]` is the primary texture, the rest form the
/// secondary texture array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelSource {
    pub model: PathBuf,
    pub textures: Vec<PathBuf>,
    pub drawings: Vec<PathBuf>,
    pub cleaner: Option<PathBuf>,
}

impl ModelSource {
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.textures.push(path.into());
        self
    }

    pub fn with_drawing(mut self, path: impl Into<PathBuf>) -> Self {
        self.drawings.push(path.into());
        self
    }

    pub fn with_cleaner(mut self, path: impl Into<PathBuf>) -> Self {
        self.cleaner = Some(path.into());
        self
    }
}

/// The five kinds of asset tracked per model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Mesh,
    MainTexture,
    TextureArray,
    DrawingArray,
    Cleaner,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssetClass::Mesh => "mesh",
            AssetClass::MainTexture => "main texture",
            AssetClass::TextureArray => "texture array",
            AssetClass::DrawingArray => "drawing array",
            AssetClass::Cleaner => "cleaner",
        })
    }
}

/// A terminal status change reported by [`ModelAssets::poll`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetEvent {
    pub class: AssetClass,
    pub status: AssetStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Mesh,
    MainTexture,
    Texture(usize),
    Drawing(usize),
    Cleaner,
}

impl Target {
    fn label(self) -> String {
        match self {
            Target::Mesh => "mesh".to_owned(),
            Target::MainTexture => "0 tex".to_owned(),
            Target::Texture(i) => format!("{} tex", i + 1),
            Target::Drawing(i) => format!("{i} draw"),
            Target::Cleaner => "cleaner".to_owned(),
        }
    }
}

enum Payload {
    Mesh(MeshData),
    Texture(TextureData),
}

struct Completion {
    target: Target,
    result: Result<Payload, String>,
}

/// Live load state of one model.
pub struct ModelAssets {
    pub mesh: LoadableAsset<MeshData>,
    /// `None` when no texture was requested.
    pub main_texture: Option<LoadableAsset<TextureData>>,
    /// `None` unless more than one texture was requested.
    pub texture_array: Option<ArrayAsset<TextureData>>,
    /// `None` when no drawings were requested.
    pub drawings: Option<ArrayAsset<TextureData>>,
    pub cleaner: Option<LoadableAsset<TextureData>>,
    rx: flume::Receiver<Completion>,
    outstanding: usize,
}

/// Start loading everything `source` names. Returns immediately.
pub fn load_model(source: &ModelSource) -> ModelAssets {
    let (tx, rx) = flume::unbounded();
    let mut assets = ModelAssets::pending(source, rx);

    spawn_decode(&tx, Target::Mesh, source.model.clone(), decode_mesh);
    if let Some((primary, secondary)) = source.textures.split_first() {
        spawn_decode(&tx, Target::MainTexture, primary.clone(), decode_texture);
        for (i, path) in secondary.iter().enumerate() {
            spawn_decode(&tx, Target::Texture(i), path.clone(), decode_texture);
        }
    }
    for (i, path) in source.drawings.iter().enumerate() {
        spawn_decode(&tx, Target::Drawing(i), path.clone(), decode_texture);
    }
    if let Some(path) = &source.cleaner {
        spawn_decode(&tx, Target::Cleaner, path.clone(), decode_texture);
    }

    assets.outstanding = 1
        + source.textures.len()
        + source.drawings.len()
        + usize::from(source.cleaner.is_some());
    log::info!(
        "Loading model {} ({} requests)",
        source.model.display(),
        assets.outstanding
    );
    assets
}

impl ModelAssets {
    fn pending(source: &ModelSource, rx: flume::Receiver<Completion>) -> Self {
        let secondary = source.textures.len().saturating_sub(1);
        Self {
            mesh: LoadableAsset::pending(),
            main_texture: (!source.textures.is_empty()).then(LoadableAsset::pending),
            texture_array: (secondary > 0).then(|| ArrayAsset::new(secondary)),
            drawings: (!source.drawings.is_empty()).then(|| ArrayAsset::new(source.drawings.len())),
            cleaner: source.cleaner.as_ref().map(|_| LoadableAsset::pending()),
            rx,
            outstanding: 0,
        }
    }

    /// Requests still in flight.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Apply every completion that arrived so far without blocking.
    pub fn poll(&mut self) -> Vec<AssetEvent> {
        let arrived: Vec<Completion> = self.rx.try_iter().collect();
        arrived
            .into_iter()
            .filter_map(|completion| self.apply(completion))
            .collect()
    }

    /// Block until every request has completed.
    pub fn wait(&mut self) -> Vec<AssetEvent> {
        let mut events = Vec::new();
        while self.outstanding > 0 {
            let Ok(completion) = self.rx.recv() else {
                log::warn!("{} loads vanished without reporting", self.outstanding);
                break;
            };
            events.extend(self.apply(completion));
        }
        events
    }

    fn apply(&mut self, completion: Completion) -> Option<AssetEvent> {
        self.outstanding = self.outstanding.saturating_sub(1);
        let Completion { target, result } = completion;
        if let Err(reason) = &result {
            log::error!("Failed to load {}: {reason}", target.label());
        }

        let (class, changed) = match target {
            Target::Mesh => (AssetClass::Mesh, self.mesh.resolve(into_mesh(result))),
            Target::MainTexture => (
                AssetClass::MainTexture,
                self.main_texture
                    .as_mut()
                    .and_then(|a| a.resolve(into_texture(result))),
            ),
            Target::Texture(i) => (
                AssetClass::TextureArray,
                self.texture_array
                    .as_mut()
                    .and_then(|a| a.record(i, into_texture(result))),
            ),
            Target::Drawing(i) => (
                AssetClass::DrawingArray,
                self.drawings
                    .as_mut()
                    .and_then(|a| a.record(i, into_texture(result))),
            ),
            Target::Cleaner => (
                AssetClass::Cleaner,
                self.cleaner
                    .as_mut()
                    .and_then(|a| a.resolve(into_texture(result))),
            ),
        };

        let status = changed?;
        log::info!("{class} {status}");
        Some(AssetEvent { class, status })
    }
}

impl fmt::Debug for ModelAssets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAssets")
            .field("mesh", &self.mesh)
            .field("main_texture", &self.main_texture)
            .field("texture_array", &self.texture_array)
            .field("drawings", &self.drawings)
            .field("cleaner", &self.cleaner)
            .field("outstanding", &self.outstanding)
            .finish()
    }
}

/// Runtime shared by every model load. `None` if it could not be built.
fn loader_runtime() -> Option<&'static Runtime> {
    static RUNTIME: OnceLock<Option<Runtime>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .thread_name("asset-loader")
                .build()
                .inspect_err(|err| log::error!("Failed to create asset loader runtime: {err}"))
                .ok()
        })
        .as_ref()
}

type Decoder = fn(&Path, &[u8]) -> Result<Payload>;

fn spawn_decode(tx: &flume::Sender<Completion>, target: Target, path: PathBuf, decode: Decoder) {
    let Some(runtime) = loader_runtime() else {
        let result = Err("asset loader runtime unavailable".to_owned());
        // The receiver lives in the ModelAssets being built, so this send succeeds.
        let _ = tx.send(Completion { target, result });
        return;
    };

    let tx = tx.clone();
    runtime.spawn(async move {
        let result = read_and_decode(target, path, decode)
            .await
            .map_err(|err| format!("{err:#}"));
        if tx.send(Completion { target, result }).is_err() {
            log::debug!("{} finished after its model was dropped", target.label());
        }
    });
}

/// Read on the runtime, decode on its blocking pool.
async fn read_and_decode(target: Target, path: PathBuf, decode: Decoder) -> Result<Payload> {
    let bytes = read_with_progress(&path, &target.label()).await?;
    tokio::task::spawn_blocking(move || decode(&path, &bytes))
        .await
        .with_context(|| format!("{} decode task aborted", target.label()))?
}

fn decode_mesh(path: &Path, bytes: &[u8]) -> Result<Payload> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "obj" => Ok(Payload::Mesh(load_obj_from_bytes(bytes)?)),
        other => bail!("Unsupported mesh format '{other}' for {}", path.display()),
    }
}

fn decode_texture(path: &Path, bytes: &[u8]) -> Result<Payload> {
    TextureData::decode(path, bytes).map(Payload::Texture)
}

fn into_mesh(result: Result<Payload, String>) -> Result<MeshData, String> {
    match result? {
        Payload::Mesh(mesh) => Ok(mesh),
        Payload::Texture(_) => Err("expected a mesh, decoded a texture".to_owned()),
    }
}

fn into_texture(result: Result<Payload, String>) -> Result<TextureData, String> {
    match result? {
        Payload::Texture(texture) => Ok(texture),
        Payload::Mesh(_) => Err("expected a texture, decoded a mesh".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshVertex;
    use crate::texture::TextureFormat;

    fn mesh() -> MeshData {
        MeshData::new(vec![MeshVertex::default(); 3], vec![0, 1, 2])
    }

    fn texture(shade: u8) -> TextureData {
        TextureData::new(1, 1, TextureFormat::Rgba8, vec![shade; 4]).unwrap()
    }

    fn assets_for(source: &ModelSource) -> (flume::Sender<Completion>, ModelAssets) {
        let (tx, rx) = flume::unbounded();
        let mut assets = ModelAssets::pending(source, rx);
        assets.outstanding = usize::MAX;
        (tx, assets)
    }

    fn ok_tex(target: Target, shade: u8) -> Completion {
        Completion {
            target,
            result: Ok(Payload::Texture(texture(shade))),
        }
    }

    #[test]
    fn only_requested_classes_exist() {
        let source = ModelSource::new("m.obj").with_texture("t.dds");
        let (_, assets) = assets_for(&source);
        assert!(assets.main_texture.is_some());
        assert!(assets.texture_array.is_none());
        assert!(assets.drawings.is_none());
        assert!(assets.cleaner.is_none());
    }

    #[test]
    fn poll_reports_each_class_once() {
        let source = ModelSource::new("m.obj")
            .with_texture("a.dds")
            .with_texture("b.dds")
            .with_texture("c.dds")
            .with_drawing("d.png")
            .with_cleaner("e.png");
        let (tx, mut assets) = assets_for(&source);

        tx.send(ok_tex(Target::Texture(1), 2)).unwrap();
        tx.send(ok_tex(Target::Drawing(0), 9)).unwrap();
        assert_eq!(
            assets.poll(),
            vec![AssetEvent {
                class: AssetClass::DrawingArray,
                status: AssetStatus::Loaded,
            }]
        );

        tx.send(ok_tex(Target::Texture(0), 1)).unwrap();
        tx.send(Completion {
            target: Target::Mesh,
            result: Ok(Payload::Mesh(mesh())),
        })
        .unwrap();
        tx.send(Completion {
            target: Target::Cleaner,
            result: Err("missing".into()),
        })
        .unwrap();
        let events = assets.poll();
        assert_eq!(events.len(), 3);
        assert!(events.contains(&AssetEvent {
            class: AssetClass::TextureArray,
            status: AssetStatus::Loaded,
        }));
        assert!(events.contains(&AssetEvent {
            class: AssetClass::Cleaner,
            status: AssetStatus::Failed,
        }));

        let array = assets.texture_array.as_ref().unwrap();
        let shades: Vec<u8> = array.payload().unwrap().iter().map(|t| t.data[0]).collect();
        assert_eq!(shades, vec![1, 2]);
        assert_eq!(assets.mesh.status(), AssetStatus::Loaded);
        assert_eq!(
            assets.main_texture.as_ref().unwrap().status(),
            AssetStatus::NotLoaded
        );
    }

    #[test]
    fn payload_kind_mismatch_fails_the_asset() {
        let source = ModelSource::new("m.obj");
        let (tx, mut assets) = assets_for(&source);
        tx.send(ok_tex(Target::Mesh, 0)).unwrap();
        assets.poll();
        assert_eq!(assets.mesh.status(), AssetStatus::Failed);
    }

    #[test]
    fn unsupported_mesh_extension_fails() {
        assert!(decode_mesh(Path::new("tex_test.drc"), b"").is_err());
    }
}
