//! Turns a chain and a pose into per-segment transforms.
//!
//! [`evaluate`] walks the chain root to tip carrying one running matrix. At each
//! segment it first translates by the segment's offset, then rotates by the joint
//! angle, and the result is that segment's model matrix. The next segment starts from
//! there, so every child is posed in its parent's final frame.
//!
//! Nothing is cached between calls. Each traversal builds fresh [`SegmentFrame`]s
//! from the current pose.

use glam::{Mat3, Mat4};

use crate::rig::Pose;
use crate::segment::{Chain, Segment};

/// The transforms for one segment in one traversal.
#[derive(Clone, Copy, Debug)]
pub struct SegmentFrame<'a> {
    pub segment: &'a Segment,
    /// Position of the segment in the chain, used to find its geometry.
    pub index: usize,
    /// Object-to-world transform.
    pub model: Mat4,
    /// Inverse-transpose of the model's linear part, for transforming normals.
    pub normal: Mat3,
    /// `view_projection * model`.
    pub mvp: Mat4,
}

/// Evaluates every segment of `chain` under `pose`.
///
/// Returns one frame per segment, in chain order. An empty chain yields an empty
/// vector, and so does a pose with a different number of angles than the chain
/// has segments.
pub fn evaluate<'a>(
    chain: &'a Chain,
    pose: &Pose,
    view_projection: Mat4,
) -> Vec<SegmentFrame<'a>> {
    if chain.len() != pose.len() {
        log::warn!(
            "pose has {} angles for a chain of {} segments, nothing to draw",
            pose.len(),
            chain.len()
        );
        return Vec::new();
    }

    let mut running = Mat4::IDENTITY;
    chain
        .iter()
        .zip(pose.angles())
        .enumerate()
        .map(|(index, (segment, &angle))| {
            running = running
                * Mat4::from_translation(segment.local_offset)
                * segment.joint_axis.rotation(angle);

            SegmentFrame {
                segment,
                index,
                model: running,
                normal: normal_matrix(running),
                mvp: view_projection * running,
            }
        })
        .collect()
}

/// Normal transform for `model`: the inverse of its upper 3×3, transposed.
///
/// For rotation plus translation this is the rotation itself. Under non-uniform
/// scale it keeps transformed normals perpendicular to transformed surfaces.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    Mat3::from_mat4(model).inverse().transpose()
}
