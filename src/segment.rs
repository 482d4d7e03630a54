//! Rigid segments and the ordered chain they form.
//!
//! A [`Segment`] is an immutable descriptor: its size, where it sits relative to its
//! parent, which axis it turns about, and how far it may turn. The angle it is
//! currently turned to lives in a [`Pose`](crate::Pose), not here.
//!
//! A [`Chain`] is the ordered list of segments from root to tip. Order is the
//! hierarchy: every segment is posed relative to the one before it.
//!
//! ```
//! use turbine_rig::{BoundPolicy, Chain, JointAxis, Segment, Vec3};
//!
//! let chain = Chain::new(vec![
//!     Segment::new("base", Vec3::new(6.0, 0.5, 6.0)).fixed(),
//!     Segment::new("shaft", Vec3::new(2.0, 25.0, 2.0))
//!         .offset(Vec3::new(0.0, 10.0, 0.0))
//!         .axis(JointAxis::Y)
//!         .bound(BoundPolicy::Wrapping)
//!         .rest_angle(90.0),
//! ]);
//! assert_eq!(chain.len(), 2);
//! ```

use glam::{Mat4, Vec3};

/// The axis a segment's joint rotates about, in the segment's own frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointAxis {
    X,
    Y,
    Z,
}

impl JointAxis {
    /// Rotation matrix for `degrees` about this axis (right-handed, counterclockwise
    /// when looking down the axis toward the origin).
    pub fn rotation(self, degrees: f32) -> Mat4 {
        let radians = degrees.to_radians();
        match self {
            JointAxis::X => Mat4::from_rotation_x(radians),
            JointAxis::Y => Mat4::from_rotation_y(radians),
            JointAxis::Z => Mat4::from_rotation_z(radians),
        }
    }
}

/// How a joint angle responds to being stepped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundPolicy {
    /// The joint never moves. Used for the root that sits at a fixed world position.
    Fixed,
    /// The angle is clamped to `[min, max]` (inclusive). Steps past a bound are
    /// discarded, leaving the angle at the bound. Reversed bounds are read in
    /// order and a NaN bound leaves that side open.
    Clamped { min: f32, max: f32 },
    /// The angle is reduced modulo 360 using the float remainder, which keeps the
    /// sign of the dividend: stepping below zero yields values in `(-360, 0]`.
    /// Any real angle is a valid rotation, so non-canonical values are harmless.
    Wrapping,
}

impl BoundPolicy {
    /// Returns the angle reached by moving `delta` degrees from `current`.
    pub fn step(self, current: f32, delta: f32) -> f32 {
        match self {
            BoundPolicy::Fixed => current,
            BoundPolicy::Clamped { min, max } => clamp_between(current + delta, min, max),
            BoundPolicy::Wrapping => (current + delta) % 360.0,
        }
    }

    /// Brings an arbitrary starting angle into the range this policy allows.
    pub fn admit(self, angle: f32) -> f32 {
        match self {
            BoundPolicy::Fixed => angle,
            BoundPolicy::Clamped { min, max } => clamp_between(angle, min, max),
            BoundPolicy::Wrapping => angle % 360.0,
        }
    }
}

// `f32::clamp` panics on reversed or NaN bounds. `max`/`min` ignore a NaN bound.
fn clamp_between(angle: f32, a: f32, b: f32) -> f32 {
    let (lo, hi) = if b < a { (b, a) } else { (a, b) };
    angle.max(lo).min(hi)
}

/// One rigid piece of the articulated model.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Identifier used in logs, errors, and tests.
    pub name: String,
    /// Box dimensions (width, height, depth). Only the geometry provider reads this.
    pub extent: Vec3,
    /// Translation from the parent's posed frame to this segment's pivot, applied
    /// before this segment's own rotation.
    pub local_offset: Vec3,
    /// Axis the joint rotates about.
    pub joint_axis: JointAxis,
    /// Joint angle in degrees at startup.
    pub rest_angle: f32,
    /// How the joint angle is bounded.
    pub bound: BoundPolicy,
}

impl Segment {
    /// A segment of the given extent with no offset, a Y axis, a rest angle of zero,
    /// and a wrapping joint.
    pub fn new(name: impl Into<String>, extent: Vec3) -> Self {
        Self {
            name: name.into(),
            extent,
            local_offset: Vec3::ZERO,
            joint_axis: JointAxis::Y,
            rest_angle: 0.0,
            bound: BoundPolicy::Wrapping,
        }
    }

    pub fn offset(mut self, offset: Vec3) -> Self {
        self.local_offset = offset;
        self
    }

    pub fn axis(mut self, axis: JointAxis) -> Self {
        self.joint_axis = axis;
        self
    }

    pub fn rest_angle(mut self, degrees: f32) -> Self {
        self.rest_angle = degrees;
        self
    }

    pub fn bound(mut self, bound: BoundPolicy) -> Self {
        self.bound = bound;
        self
    }

    /// Shorthand for `.bound(BoundPolicy::Fixed)`.
    pub fn fixed(self) -> Self {
        self.bound(BoundPolicy::Fixed)
    }

    /// Shorthand for a symmetric clamp, `[-|limit|, |limit|]`.
    pub fn clamped(self, limit: f32) -> Self {
        let limit = limit.abs();
        self.bound(BoundPolicy::Clamped {
            min: -limit,
            max: limit,
        })
    }
}

/// An ordered, root-first sequence of segments.
///
/// The chain is built once and never changes shape. Insertion order is the order
/// transforms are composed in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chain {
    segments: Vec<Segment>,
}

impl Chain {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Chain index of the first segment called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(130.0, 3.0, 133.0 ; "inside the range")]
    #[test_case(134.0, 3.0, 135.0 ; "stops at the upper bound")]
    #[test_case(135.0, 3.0, 135.0 ; "stays at the upper bound")]
    #[test_case(-134.0, -3.0, -135.0 ; "stops at the lower bound")]
    fn clamped_step(current: f32, delta: f32, expected: f32) {
        let policy = BoundPolicy::Clamped {
            min: -135.0,
            max: 135.0,
        };
        assert_eq!(policy.step(current, delta), expected);
    }

    #[test_case(357.0, 3.0, 0.0 ; "wraps to zero")]
    #[test_case(358.0, 3.0, 1.0 ; "wraps past zero")]
    #[test_case(0.0, -3.0, -3.0 ; "negative stays negative")]
    #[test_case(-358.0, -3.0, -1.0 ; "negative wraps toward zero")]
    fn wrapping_step(current: f32, delta: f32, expected: f32) {
        assert_eq!(BoundPolicy::Wrapping.step(current, delta), expected);
    }

    #[test_case(-135.0, 135.0 ; "ordered")]
    #[test_case(135.0, -135.0 ; "reversed")]
    fn clamp_bounds_in_either_order(min: f32, max: f32) {
        let policy = BoundPolicy::Clamped { min, max };
        assert_eq!(policy.step(134.0, 3.0), 135.0);
        assert_eq!(policy.step(-134.0, -3.0), -135.0);
        assert_eq!(policy.admit(200.0), 135.0);
    }

    #[test]
    fn nan_bound_leaves_that_side_open() {
        let policy = BoundPolicy::Clamped {
            min: f32::NAN,
            max: 60.0,
        };
        assert_eq!(policy.step(58.0, 3.0), 60.0);
        assert_eq!(policy.step(-500.0, -3.0), -503.0);
    }

    #[test]
    fn negative_clamp_limit_means_its_magnitude() {
        let segment = Segment::new("hinge", Vec3::ONE).clamped(-60.0);
        assert_eq!(
            segment.bound,
            BoundPolicy::Clamped {
                min: -60.0,
                max: 60.0
            }
        );
    }

    #[test]
    fn fixed_never_moves() {
        assert_eq!(BoundPolicy::Fixed.step(12.0, 3.0), 12.0);
        assert_eq!(BoundPolicy::Fixed.step(12.0, -3.0), 12.0);
    }

    #[test]
    fn admit_brings_rest_angles_into_range() {
        assert_eq!(BoundPolicy::Wrapping.admit(450.0), 90.0);
        assert_eq!(
            BoundPolicy::Clamped {
                min: -60.0,
                max: 60.0
            }
            .admit(75.0),
            60.0
        );
    }

    #[test]
    fn rotation_about_each_axis_leaves_that_axis_alone() {
        for (axis, unit) in [
            (JointAxis::X, Vec3::X),
            (JointAxis::Y, Vec3::Y),
            (JointAxis::Z, Vec3::Z),
        ] {
            let rotated = axis.rotation(37.0).transform_vector3(unit);
            assert!(rotated.abs_diff_eq(unit, 1e-6), "{axis:?}: {rotated}");
        }
    }

    #[test]
    fn quarter_turn_about_y_sends_x_to_negative_z() {
        let rotated = JointAxis::Y.rotation(90.0).transform_vector3(Vec3::X);
        assert!(rotated.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn chain_keeps_insertion_order() {
        let chain = Chain::new(vec![
            Segment::new("root", Vec3::ONE),
            Segment::new("middle", Vec3::ONE),
            Segment::new("tip", Vec3::ONE),
        ]);

        let names: Vec<&str> = chain.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["root", "middle", "tip"]);
        assert_eq!(chain.position("tip"), Some(2));
        assert_eq!(chain.position("missing"), None);
    }

    #[test]
    fn clamped_shorthand_is_symmetric() {
        let segment = Segment::new("rotor", Vec3::ONE).clamped(60.0);
        assert_eq!(
            segment.bound,
            BoundPolicy::Clamped {
                min: -60.0,
                max: 60.0
            }
        );
    }
}
