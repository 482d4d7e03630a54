//! Error types for setup, per-frame rendering, and the application loop.
//!
//! Failures fall into two tiers:
//!
//! - [`SetupError`]: anything that goes wrong before the first frame. These are
//!   fatal. Rendering never begins and [`run`](crate::run) returns the error.
//! - [`RenderError`]: a precondition violation discovered while dispatching a frame.
//!   The frame is skipped and logged. The next pose change tries again.
//!
//! Unrecognized key presses are not errors at all and never surface here.

use thiserror::Error;

/// Fatal errors raised while acquiring the window, GPU, or shader resources.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,

    #[error("shader program failed to compile or link: {0}")]
    Program(String),

    #[error("refusing to create empty buffer '{0}'")]
    EmptyBuffer(String),

    #[error("attribute '{0}' is not declared by the shader program")]
    UnresolvedAttribute(&'static str),

    #[error("uniform '{0}' is not declared by the shader program")]
    UnresolvedUniform(&'static str),
}

/// Per-frame failures. The frame that raised one is not presented.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot draw segment '{segment}': location '{name}' was never resolved")]
    UnresolvedLocation { segment: String, name: &'static str },

    #[error("cannot draw segment '{segment}': no geometry uploaded for chain index {index}")]
    MissingGeometry { segment: String, index: usize },

    #[error("draw issued with no shader program in use")]
    NoProgram,

    #[error("failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Top-level error returned by [`run`](crate::run).
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}
