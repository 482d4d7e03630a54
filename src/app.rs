//! Window, event loop, and the redraw-on-change cycle.
//!
//! The model is drawn once when the window appears, then again only after a key
//! press moves a joint or the window system asks for a redraw. Nothing animates on
//! its own, so the loop waits for events instead of polling.

use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::dispatcher::SegmentRenderer;
use crate::error::{AppError, RenderError, SetupError};
use crate::evaluator::evaluate;
use crate::gpu::GpuContext;
use crate::input::key_press;
use crate::mesh_pass::MeshPass;
use crate::rig::{ANGLE_STEP, Rig};
use crate::turbine::turbine_rig;

/// Configuration for the turbine window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Viewpoint. Its aspect ratio is replaced by the window's.
    pub camera: Camera,
    /// Degrees per key press.
    pub angle_step: f32,
    pub clear_color: wgpu::Color,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Turbine Rig".to_string(),
            width: 1000,
            height: 500,
            camera: Camera::default(),
            angle_step: ANGLE_STEP,
            clear_color: wgpu::Color::BLUE,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn angle_step(mut self, degrees: f32) -> Self {
        self.angle_step = degrees;
        self
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }
}

/// Opens the turbine window with default settings and runs until it is closed.
pub fn run() -> Result<(), AppError> {
    run_with_config(AppConfig::default())
}

/// Runs the turbine with custom configuration.
///
/// # Example
/// ```no_run
/// use turbine_rig::{AppConfig, Camera};
///
/// turbine_rig::run_with_config(
///     AppConfig::new()
///         .title("Turbine")
///         .size(1280, 720)
///         .camera(Camera::new().at(30.0, 10.0, 30.0))
///         .angle_step(5.0),
/// )?;
/// # Ok::<(), turbine_rig::AppError>(())
/// ```
pub fn run_with_config(config: AppConfig) -> Result<(), AppError> {
    let rig = turbine_rig().with_step(config.angle_step);
    run_rig(config, rig)
}

/// Runs an arbitrary rig in a window.
pub fn run_rig(config: AppConfig, rig: Rig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = TurbineApp::Pending {
        config,
        rig: Some(rig),
    };
    event_loop.run_app(&mut app)?;

    match app {
        TurbineApp::Failed(error) => Err(error.into()),
        _ => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    pass: MeshPass,
    renderer: SegmentRenderer<MeshPass>,
    camera: Camera,
    rig: Rig,
}

enum TurbineApp {
    Pending { config: AppConfig, rig: Option<Rig> },
    Running(Running),
    Failed(SetupError),
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: &AppConfig, rig: Rig) -> Result<Self, SetupError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let camera = config.camera.with_aspect(gpu.aspect());

        let mut pass = MeshPass::new(gpu, config.clear_color);
        let renderer = SegmentRenderer::upload(&mut pass, rig.chain())?;
        renderer.validate()?;

        log::info!(
            "{} segments ready, {}° per key press",
            renderer.segment_count(),
            rig.step()
        );
        log_controls(&rig);

        window.request_redraw();

        Ok(Self {
            window,
            pass,
            renderer,
            camera,
            rig,
        })
    }

    fn draw(&mut self) -> Result<usize, RenderError> {
        let frames = evaluate(
            self.rig.chain(),
            self.rig.pose(),
            self.camera.view_projection(),
        );
        self.renderer.render(&mut self.pass, &frames)?;
        self.pass.present()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.pass.resize(width, height);
        self.camera.aspect = self.pass.gpu().aspect();
        self.window.request_redraw();
    }
}

fn log_controls(rig: &Rig) {
    for (index, segment) in rig.chain().iter().enumerate() {
        if let Some((increase, decrease)) = rig.keys().keys_for(index) {
            log::info!("{}: {increase:?} / {decrease:?}", segment.name);
        }
    }
}

impl ApplicationHandler for TurbineApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let TurbineApp::Pending { config, rig } = self else {
            return;
        };
        let Some(rig) = rig.take() else {
            return;
        };

        let next = match Running::start(event_loop, config, rig) {
            Ok(running) => TurbineApp::Running(running),
            Err(e) => {
                log::error!("setup failed: {e}");
                event_loop.exit();
                TurbineApp::Failed(e)
            }
        };
        *self = next;
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let TurbineApp::Running(running) = self else {
            return;
        };

        if let Some(key) = key_press(&event) {
            if running.rig.apply_input(key) {
                running.window.request_redraw();
            }
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => match running.draw() {
                Ok(draws) => log::trace!("presented {draws} segments"),
                Err(e) => {
                    log::error!("frame skipped: {e}");
                    running.pass.discard_frame();
                }
            },
            _ => {}
        }
    }
}
