//! The wind turbine: a fixed base, a spinning shaft, a swivelling generator
//! housing with a marker blob on top, and a tilting rotor hub.
//!
//! | Segment          | Keys                       | Limits          |
//! |------------------|----------------------------|-----------------|
//! | `shaft`          | Right / Left arrow         | free            |
//! | `generator`      | Down / Up arrow            | ±135°           |
//! | `generator_blob` | Z / X                      | free            |
//! | `rotor`          | V / C                      | ±60°            |

use glam::Vec3;
use winit::keyboard::KeyCode;

use crate::rig::{KeyMap, Rig};
use crate::segment::{Chain, JointAxis, Segment};

pub const BASE: usize = 0;
pub const SHAFT: usize = 1;
pub const GENERATOR: usize = 2;
pub const GENERATOR_BLOB: usize = 3;
pub const ROTOR: usize = 4;

/// The turbine's segments, root first.
pub fn turbine_chain() -> Chain {
    Chain::new(vec![
        Segment::new("base", Vec3::new(6.0, 0.5, 6.0))
            .offset(Vec3::new(0.0, -17.5, 0.0))
            .fixed(),
        Segment::new("shaft", Vec3::new(2.0, 25.0, 2.0))
            .offset(Vec3::new(0.0, 10.0, 0.0))
            .rest_angle(90.0),
        Segment::new("generator", Vec3::new(4.0, 3.0, 6.0))
            .offset(Vec3::new(0.0, 12.5, 0.0))
            .clamped(135.0)
            .rest_angle(45.0),
        Segment::new("generator_blob", Vec3::new(0.5, 0.3, 0.8))
            .offset(Vec3::new(0.0, 3.0, 0.0)),
        Segment::new("rotor", Vec3::splat(1.5))
            .offset(Vec3::new(0.0, 2.0, 2.0))
            .axis(JointAxis::X)
            .clamped(60.0),
    ])
}

pub fn turbine_keys() -> KeyMap {
    KeyMap::new()
        .bind(SHAFT, KeyCode::ArrowRight, KeyCode::ArrowLeft)
        .bind(GENERATOR, KeyCode::ArrowDown, KeyCode::ArrowUp)
        .bind(GENERATOR_BLOB, KeyCode::KeyZ, KeyCode::KeyX)
        .bind(ROTOR, KeyCode::KeyV, KeyCode::KeyC)
}

/// The turbine at rest, with its default key bindings.
pub fn turbine_rig() -> Rig {
    Rig::new(turbine_chain(), turbine_keys())
}
