//! Platform layer: window ("canvas") and event loop driving the viewer.
//!
//! - The window is created on `resumed`; failing to create it aborts startup.
//! - While assets are in flight the loop wakes periodically to apply them.
//! - Once the model is in the scene, every frame requests the next one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

pub mod input;
pub mod viewer;

pub use viewer::{Viewer, ViewerConfig};

/// How often pending loads are checked while nothing else wakes the loop.
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Can't find container canvas: {0}")]
    CanvasNotFound(#[from] winit::error::OsError),
    #[error("Renderer initialization failed: {0}")]
    Renderer(#[from] renderer::RenderError),
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("GPU out of memory")]
    OutOfMemory,
}

struct App {
    config: ViewerConfig,
    viewer: Option<Viewer>,
    failure: Option<ViewerError>,
}

impl App {
    fn abort(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        log::error!("{err}");
        self.failure = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() || self.failure.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.config.canvas.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.abort(event_loop, err.into()),
        };
        log::info!(
            "Canvas '{}' created: {}x{}",
            self.config.canvas,
            window.inner_size().width,
            window.inner_size().height
        );

        match Viewer::new(window, self.config.clone()) {
            Ok(mut viewer) => {
                viewer.load();
                self.viewer = Some(viewer);
            }
            Err(err) => self.abort(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            log::info!("Close requested. Exiting event loop.");
            event_loop.exit();
            return;
        }
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if let Err(err) = viewer.handle_window_event(&event) {
            self.abort(event_loop, err);
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.handle_device_event(&event);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        viewer.pump_assets();
        if viewer.is_loading() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(
                Instant::now() + LOAD_POLL_INTERVAL,
            ));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}

/// Open the canvas, load the configured model and run until the window closes.
pub fn run_viewer(config: ViewerConfig) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App {
        config,
        viewer: None,
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
