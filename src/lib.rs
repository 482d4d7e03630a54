//! # Turbine Rig
//!
//! **An articulated wind turbine you pose from the keyboard.**
//!
//! The model is a chain of boxes. Each box hangs off the one before it at a fixed
//! offset and turns about one axis. Key presses step joint angles, the chain is
//! re-evaluated into world matrices, and each box is drawn with simple directional
//! lighting.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> Result<(), turbine_rig::AppError> {
//!     turbine_rig::run()
//! }
//! ```
//!
//! ## Posing without a window
//!
//! ```
//! use turbine_rig::{KeyCode, Mat4, evaluate, turbine_rig};
//!
//! let mut rig = turbine_rig();
//! rig.apply_input(KeyCode::ArrowRight);
//!
//! let frames = evaluate(rig.chain(), rig.pose(), Mat4::IDENTITY);
//! assert_eq!(frames.len(), rig.chain().len());
//! ```
//!
//! ## Pipeline
//!
//! - [`Rig`] holds the [`Chain`] and its [`Pose`] and applies key presses.
//! - [`evaluate`] walks the chain root to tip and yields one [`SegmentFrame`] per box.
//! - [`SegmentRenderer`] turns frames into draws on any [`GraphicsContext`].
//!   [`MeshPass`] is the wgpu one.

mod app;
mod camera;
mod dispatcher;
mod error;
mod evaluator;
mod geometry;
mod gpu;
mod graphics;
mod input;
mod mesh_pass;
mod rig;
mod segment;
pub mod turbine;

pub use app::{AppConfig, run, run_rig, run_with_config};
pub use camera::Camera;
pub use dispatcher::{
    Locations, SEGMENT_FRAGMENT_SHADER, SEGMENT_VERTEX_SHADER, SegmentRenderer,
};
pub use error::{AppError, RenderError, SetupError};
pub use evaluator::{SegmentFrame, evaluate, normal_matrix};
pub use geometry::{BOX_INDEX_COUNT, BOX_VERTEX_COUNT, BoxGeometry};
pub use gpu::GpuContext;
pub use graphics::{
    GraphicsContext, MVP_UNIFORM, NORMAL_ATTRIBUTE, NORMAL_UNIFORM, POSITION_ATTRIBUTE,
};
pub use input::key_press;
pub use mesh_pass::{AttributeSlot, BufferId, MeshPass, ProgramId, SegmentUniforms, UniformSlot};
pub use rig::{ANGLE_STEP, Direction, JointAction, KeyMap, Pose, Rig};
pub use segment::{BoundPolicy, Chain, JointAxis, Segment};
pub use turbine::{turbine_chain, turbine_keys, turbine_rig};

// Re-export glam math types for convenience
pub use glam::{Mat3, Mat4, Vec3};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
