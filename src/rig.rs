//! The posable model: a chain, its current pose, and the keys that move it.
//!
//! [`Rig`] is the only thing that writes joint angles. Every change goes through
//! [`Rig::apply_input`], which looks the key up in a [`KeyMap`], steps the bound
//! segment under that segment's [`BoundPolicy`](crate::BoundPolicy), and reports
//! whether anything actually moved.
//!
//! ```
//! use turbine_rig::{KeyCode, turbine_rig};
//!
//! let mut rig = turbine_rig();
//! let shaft = rig.chain().position("shaft").unwrap();
//!
//! assert!(rig.apply_input(KeyCode::ArrowRight));
//! assert_eq!(rig.pose().angle(shaft), Some(93.0));
//!
//! // Unmapped keys are ignored
//! assert!(!rig.apply_input(KeyCode::KeyQ));
//! ```

use std::collections::HashMap;

use winit::keyboard::KeyCode;

use crate::segment::Chain;

/// Default joint step in degrees.
pub const ANGLE_STEP: f32 = 3.0;

/// Joint angles in degrees, one per chain segment, in chain order.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    angles: Vec<f32>,
}

impl Pose {
    /// The startup pose: each segment's rest angle, admitted by its bound policy.
    pub fn rest(chain: &Chain) -> Self {
        Self {
            angles: chain.iter().map(|s| s.bound.admit(s.rest_angle)).collect(),
        }
    }

    pub fn angle(&self, index: usize) -> Option<f32> {
        self.angles.get(index).copied()
    }

    pub fn angles(&self) -> &[f32] {
        &self.angles
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }
}

/// Which way a key turns its joint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    fn signum(self) -> f32 {
        match self {
            Direction::Increase => 1.0,
            Direction::Decrease => -1.0,
        }
    }
}

/// A joint adjustment bound to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JointAction {
    /// Chain index of the segment to move.
    pub segment: usize,
    pub direction: Direction,
}

/// Fixed table from keys to joint actions.
#[derive(Clone, Debug, Default)]
pub struct KeyMap {
    bindings: HashMap<KeyCode, JointAction>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a pair of keys to turn `segment` up and down.
    pub fn bind(mut self, segment: usize, increase: KeyCode, decrease: KeyCode) -> Self {
        self.bindings.insert(
            increase,
            JointAction {
                segment,
                direction: Direction::Increase,
            },
        );
        self.bindings.insert(
            decrease,
            JointAction {
                segment,
                direction: Direction::Decrease,
            },
        );
        self
    }

    pub fn action(&self, key: KeyCode) -> Option<JointAction> {
        self.bindings.get(&key).copied()
    }

    /// Keys bound to `segment`, as `(increase, decrease)` when both exist.
    pub fn keys_for(&self, segment: usize) -> Option<(KeyCode, KeyCode)> {
        let find = |direction| {
            self.bindings
                .iter()
                .find(|(_, a)| a.segment == segment && a.direction == direction)
                .map(|(k, _)| *k)
        };
        Some((find(Direction::Increase)?, find(Direction::Decrease)?))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// A chain, its pose, and the keys that pose it.
#[derive(Clone, Debug)]
pub struct Rig {
    chain: Chain,
    pose: Pose,
    keys: KeyMap,
    step: f32,
}

impl Rig {
    /// Creates a rig at its rest pose.
    ///
    /// Bindings that point past the end of the chain are dropped with a warning.
    pub fn new(chain: Chain, mut keys: KeyMap) -> Self {
        keys.bindings.retain(|key, action| {
            let known = action.segment < chain.len();
            if !known {
                log::warn!(
                    "ignoring binding {key:?}: chain has no segment {}",
                    action.segment
                );
            }
            known
        });

        Self {
            pose: Pose::rest(&chain),
            chain,
            keys,
            step: ANGLE_STEP,
        }
    }

    /// Sets the number of degrees one key press turns a joint.
    pub fn with_step(mut self, degrees: f32) -> Self {
        self.step = degrees;
        self
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn keys(&self) -> &KeyMap {
        &self.keys
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Applies one key press to the pose.
    ///
    /// Returns `true` when a joint angle changed and the model should be redrawn.
    /// Unmapped keys, pushes against a clamp bound, and presses on a fixed joint
    /// return `false` and leave the pose untouched.
    pub fn apply_input(&mut self, key: KeyCode) -> bool {
        let Some(action) = self.keys.action(key) else {
            log::trace!("ignoring unmapped key {key:?}");
            return false;
        };

        let segment = &self.chain.segments()[action.segment];
        let current = self.pose.angles[action.segment];
        let next = segment
            .bound
            .step(current, action.direction.signum() * self.step);

        if next.to_bits() == current.to_bits() {
            log::trace!("{} held at {current}", segment.name);
            return false;
        }

        log::debug!("{}: {current} -> {next}", segment.name);
        self.pose.angles[action.segment] = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{BoundPolicy, JointAxis, Segment};
    use glam::Vec3;
    use pretty_assertions::assert_eq;

    fn hinge_and_spinner() -> Rig {
        let chain = Chain::new(vec![
            Segment::new("base", Vec3::ONE).fixed(),
            Segment::new("hinge", Vec3::ONE)
                .axis(JointAxis::Z)
                .clamped(135.0)
                .rest_angle(45.0),
            Segment::new("spinner", Vec3::ONE)
                .bound(BoundPolicy::Wrapping)
                .rest_angle(90.0),
        ]);
        let keys = KeyMap::new()
            .bind(0, KeyCode::KeyB, KeyCode::KeyN)
            .bind(1, KeyCode::ArrowDown, KeyCode::ArrowUp)
            .bind(2, KeyCode::ArrowRight, KeyCode::ArrowLeft);
        Rig::new(chain, keys)
    }

    #[test]
    fn rest_pose_follows_chain_order() {
        let rig = hinge_and_spinner();
        assert_eq!(rig.pose().angles(), &[0.0, 45.0, 90.0]);
    }

    #[test]
    fn mapped_key_steps_its_joint() {
        let mut rig = hinge_and_spinner();

        assert!(rig.apply_input(KeyCode::ArrowDown));
        assert!(rig.apply_input(KeyCode::ArrowLeft));

        assert_eq!(rig.pose().angles(), &[0.0, 48.0, 87.0]);
    }

    #[test]
    fn clamp_is_idempotent_at_the_bound() {
        let mut rig = hinge_and_spinner();

        // 45 -> 135 takes thirty presses
        for _ in 0..30 {
            assert!(rig.apply_input(KeyCode::ArrowDown));
        }
        assert_eq!(rig.pose().angle(1), Some(135.0));

        for _ in 0..50 {
            assert!(!rig.apply_input(KeyCode::ArrowDown));
            assert_eq!(rig.pose().angle(1), Some(135.0));
        }

        // and it still moves back off the bound
        assert!(rig.apply_input(KeyCode::ArrowUp));
        assert_eq!(rig.pose().angle(1), Some(132.0));
    }

    #[test]
    fn wrap_returns_to_start_after_a_full_turn() {
        let mut rig = hinge_and_spinner();
        let start = rig.pose().angle(2).unwrap();

        for _ in 0..120 {
            assert!(rig.apply_input(KeyCode::ArrowRight));
        }

        let end = rig.pose().angle(2).unwrap();
        assert_eq!(end.rem_euclid(360.0), start.rem_euclid(360.0));
    }

    #[test]
    fn wrap_below_zero_stays_negative() {
        let mut rig = hinge_and_spinner();

        // 90 -> -3 in 31 presses
        for _ in 0..31 {
            rig.apply_input(KeyCode::ArrowLeft);
        }

        assert_eq!(rig.pose().angle(2), Some(-3.0));
    }

    #[test]
    fn unmapped_key_is_a_no_op() {
        let mut rig = hinge_and_spinner();
        let before: Vec<u32> = rig.pose().angles().iter().map(|a| a.to_bits()).collect();

        for key in [KeyCode::KeyQ, KeyCode::Space, KeyCode::Escape, KeyCode::F1] {
            assert!(!rig.apply_input(key));
        }

        let after: Vec<u32> = rig.pose().angles().iter().map(|a| a.to_bits()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn fixed_joint_ignores_its_keys() {
        let mut rig = hinge_and_spinner();

        assert!(!rig.apply_input(KeyCode::KeyB));
        assert!(!rig.apply_input(KeyCode::KeyN));
        assert_eq!(rig.pose().angle(0), Some(0.0));
    }

    #[test]
    fn custom_step_size() {
        let mut rig = hinge_and_spinner().with_step(10.0);

        rig.apply_input(KeyCode::ArrowRight);

        assert_eq!(rig.pose().angle(2), Some(100.0));
    }

    #[test]
    fn negative_clamp_limit_builds_a_working_rig() {
        let chain = Chain::new(vec![
            Segment::new("hinge", Vec3::ONE)
                .clamped(-60.0)
                .rest_angle(90.0),
        ]);
        let keys = KeyMap::new().bind(0, KeyCode::KeyW, KeyCode::KeyS);

        let mut rig = Rig::new(chain, keys);
        assert_eq!(rig.pose().angle(0), Some(60.0));

        assert!(!rig.apply_input(KeyCode::KeyW));
        assert!(rig.apply_input(KeyCode::KeyS));
        assert_eq!(rig.pose().angle(0), Some(57.0));
    }

    #[test]
    fn bindings_past_the_chain_are_dropped() {
        let chain = Chain::new(vec![Segment::new("only", Vec3::ONE)]);
        let keys = KeyMap::new()
            .bind(0, KeyCode::KeyA, KeyCode::KeyD)
            .bind(7, KeyCode::KeyW, KeyCode::KeyS);

        let mut rig = Rig::new(chain, keys);

        assert_eq!(rig.keys().len(), 2);
        assert!(!rig.apply_input(KeyCode::KeyW));
    }

    #[test]
    fn keys_for_reports_both_directions() {
        let rig = hinge_and_spinner();
        assert_eq!(
            rig.keys().keys_for(2),
            Some((KeyCode::ArrowRight, KeyCode::ArrowLeft))
        );
        assert_eq!(rig.keys().keys_for(9), None);
    }
}
