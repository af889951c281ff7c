//! The viewer: one window ("canvas"), one model, orbit controls.

use std::path::PathBuf;
use std::sync::Arc;

use asset::{AssetClass, AssetStatus, ModelAssets, ModelSource, load_model};
use corelib::{
    camera::Camera,
    clock::{Clock, FpsCounter},
    orbit::OrbitControl,
    pointer::PointerTracker,
    transform::Transform,
};
use renderer::{GpuState, SceneLook};
use winit::{
    event::{DeviceEvent, WindowEvent},
    window::Window,
};

use crate::ViewerError;
use crate::input::{route_device_input, route_window_input};

pub const DEFAULT_MODEL: &str = "storage/model/tex_test.obj";
pub const DEFAULT_TEXTURE: &str = "storage/textures/main_tex_bc3.dds";
pub const DEFAULT_CANVAS: &str = "viewer-canvas";

/// Everything needed to build a [`Viewer`].
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Title of the output window.
    pub canvas: String,
    pub width: u32,
    pub height: u32,
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub source: ModelSource,
    /// Nearest camera distance as a multiple of the model's bounding radius.
    pub min_dist_radii: f32,
    pub max_dist: f32,
    pub look: SceneLook,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            canvas: DEFAULT_CANVAS.to_owned(),
            width: 1280,
            height: 720,
            backends: wgpu::Backends::all(),
            show_fps: false,
            source: ModelSource::new(DEFAULT_MODEL).with_texture(PathBuf::from(DEFAULT_TEXTURE)),
            min_dist_radii: 2.0,
            max_dist: 500.0,
            look: SceneLook::default(),
        }
    }
}

pub struct Viewer {
    window: Arc<Window>,
    gpu: GpuState,
    config: ViewerConfig,

    camera: Camera,
    model: Transform,
    clock: Clock,
    fps: Option<FpsCounter>,

    assets: Option<ModelAssets>,
    /// Present once the mesh loaded; input is ignored until then.
    control: Option<OrbitControl>,
    pointer: PointerTracker,
    /// Continuous redraw, started when the mesh is in the scene.
    running: bool,
}

impl Viewer {
    pub fn new(window: Arc<Window>, config: ViewerConfig) -> Result<Self, ViewerError> {
        let gpu = GpuState::new_blocking(window.clone(), config.backends, config.look)?;
        let camera = Camera::viewer_default(gpu.aspect());
        let fps = config.show_fps.then(FpsCounter::new);
        Ok(Self {
            window,
            gpu,
            config,
            camera,
            model: Transform::identity(),
            clock: Clock::new(),
            fps,
            assets: None,
            control: None,
            pointer: PointerTracker::new(),
            running: false,
        })
    }

    /// Start loading the configured model. Later calls are ignored.
    pub fn load(&mut self) {
        if self.assets.is_some() {
            return;
        }
        self.assets = Some(load_model(&self.config.source));
    }

    /// Whether asset completions are still expected.
    pub fn is_loading(&self) -> bool {
        self.assets
            .as_ref()
            .is_some_and(|assets| assets.outstanding() > 0)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Apply finished loads to the scene.
    pub fn pump_assets(&mut self) {
        let Some(assets) = self.assets.as_mut() else {
            return;
        };
        let events = assets.poll();
        for event in events {
            match (event.class, event.status) {
                (AssetClass::Mesh, AssetStatus::Loaded) => self.init_model(),
                (AssetClass::MainTexture, AssetStatus::Loaded) => self.apply_map(),
                (class, AssetStatus::Failed) => {
                    log::warn!("{class} unavailable; continuing without it")
                }
                _ => {}
            }
        }
    }

    fn init_model(&mut self) {
        let Some(mesh) = self.assets.as_ref().and_then(|a| a.mesh.payload()) else {
            return;
        };
        let sphere = mesh.bounding_sphere();
        log::info!("Model bounding radius: {}", sphere.radius);
        self.gpu.set_mesh(mesh);

        match OrbitControl::new(sphere.radius * self.config.min_dist_radii, self.config.max_dist) {
            Ok(control) => self.control = Some(control),
            Err(err) => log::error!("Orbit controls disabled: {err}"),
        }

        // Time spent loading must not count as the first frame's delta.
        self.clock.delta();
        self.running = true;
        self.window.request_redraw();
    }

    fn apply_map(&mut self) {
        let map = self
            .assets
            .as_ref()
            .and_then(|a| a.main_texture.as_ref())
            .and_then(|t| t.payload());
        if let Some(texture) = map {
            self.gpu.set_map(texture);
        }
    }

    /// Route a window event. Returns `Err` only for unrecoverable surface loss.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Result<(), ViewerError> {
        match event {
            WindowEvent::Resized(size) => {
                self.gpu.resize(size.width, size.height);
                self.window.request_redraw();
            }
            WindowEvent::RedrawRequested => self.frame()?,
            _ => route_window_input(event, &mut self.pointer, self.control.as_mut()),
        }
        Ok(())
    }

    /// Raw device input; drives the drag while the pointer is armed.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        route_device_input(event, &self.pointer, self.control.as_mut());
    }

    fn frame(&mut self) -> Result<(), ViewerError> {
        let dt = self.clock.delta();
        if let Some(control) = self.control.as_mut() {
            control.move_frame(dt, &mut self.model, &mut self.camera);
        }

        match self.gpu.render(&self.camera, self.model.matrix()) {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface lost ({err:?}); reconfiguring");
                self.gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(ViewerError::OutOfMemory),
            Err(err) => log::warn!("Skipping frame: {err:?}"),
        }

        if let Some(rate) = self.fps.as_mut().and_then(FpsCounter::frame) {
            self.window
                .set_title(&format!("{} ({rate:.0} fps)", self.config.canvas));
        }
        if self.running {
            self.window.request_redraw();
        }
        Ok(())
    }
}
