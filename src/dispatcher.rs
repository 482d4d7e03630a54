//! Issues one draw per evaluated segment.
//!
//! [`SegmentRenderer`] owns the uploaded geometry handles and the resolved shader
//! locations. Setup never fails on an unresolved location on its own. It records
//! the gap, [`SegmentRenderer::validate`] reports it as a [`SetupError`], and
//! [`SegmentRenderer::render`] refuses to draw while it remains.

use glam::Mat4;

use crate::error::{RenderError, SetupError};
use crate::evaluator::SegmentFrame;
use crate::geometry::BoxGeometry;
use crate::graphics::{
    GraphicsContext, MVP_UNIFORM, NORMAL_ATTRIBUTE, NORMAL_UNIFORM, POSITION_ATTRIBUTE,
};
use crate::segment::Chain;

pub const SEGMENT_VERTEX_SHADER: &str = include_str!("shaders/segment_vertex.wgsl");
pub const SEGMENT_FRAGMENT_SHADER: &str = include_str!("shaders/segment_fragment.wgsl");

/// Shader inputs looked up at setup. `None` means the program does not declare it.
pub struct Locations<G: GraphicsContext> {
    pub position: Option<G::AttributeLocation>,
    pub normal: Option<G::AttributeLocation>,
    pub mvp: Option<G::UniformLocation>,
    pub normal_matrix: Option<G::UniformLocation>,
}

impl<G: GraphicsContext> Locations<G> {
    fn resolve(gfx: &G, program: &G::Program) -> Self {
        Self {
            position: gfx.resolve_attribute(program, POSITION_ATTRIBUTE),
            normal: gfx.resolve_attribute(program, NORMAL_ATTRIBUTE),
            mvp: gfx.resolve_uniform(program, MVP_UNIFORM),
            normal_matrix: gfx.resolve_uniform(program, NORMAL_UNIFORM),
        }
    }

    /// The two matrix uniforms, or the name of the first unresolved location.
    fn uniforms(&self) -> Result<(G::UniformLocation, G::UniformLocation), &'static str> {
        self.position.ok_or(POSITION_ATTRIBUTE)?;
        self.normal.ok_or(NORMAL_ATTRIBUTE)?;
        let mvp = self.mvp.ok_or(MVP_UNIFORM)?;
        let normal_matrix = self.normal_matrix.ok_or(NORMAL_UNIFORM)?;
        Ok((mvp, normal_matrix))
    }
}

/// Draws a chain of box segments through a [`GraphicsContext`].
pub struct SegmentRenderer<G: GraphicsContext> {
    program: G::Program,
    locations: Locations<G>,
    /// One position buffer per chain segment, by chain index.
    positions: Vec<G::Buffer>,
    normals: G::Buffer,
    indices: G::Buffer,
    index_count: u32,
}

impl<G: GraphicsContext> SegmentRenderer<G> {
    /// Compiles the segment program and uploads a box for every segment in `chain`.
    pub fn upload(gfx: &mut G, chain: &Chain) -> Result<Self, SetupError> {
        Self::upload_with_shaders(gfx, chain, SEGMENT_VERTEX_SHADER, SEGMENT_FRAGMENT_SHADER)
    }

    /// Like [`upload`](Self::upload) with caller-supplied shader sources.
    pub fn upload_with_shaders(
        gfx: &mut G,
        chain: &Chain,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, SetupError> {
        let program = gfx.compile_program(vertex_src, fragment_src)?;
        let locations = Locations::resolve(gfx, &program);

        // Normals and indices do not depend on the box size.
        let layout = BoxGeometry::new(1.0, 1.0, 1.0);
        let normals = gfx.create_vertex_buffer("Box Normals", &layout.normals)?;
        let indices = gfx.create_index_buffer("Box Indices", &layout.indices)?;

        let positions = chain
            .iter()
            .map(|segment| {
                let geom = BoxGeometry::from_extent(segment.extent);
                gfx.create_vertex_buffer(&segment.name, &geom.positions)
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "uploaded {} segment boxes ({} indices each)",
            positions.len(),
            layout.indices.len()
        );

        Ok(Self {
            program,
            locations,
            positions,
            normals,
            indices,
            index_count: layout.indices.len() as u32,
        })
    }

    /// Fails if any shader location could not be resolved.
    pub fn validate(&self) -> Result<(), SetupError> {
        match self.locations.uniforms() {
            Ok(_) => Ok(()),
            Err(name) if name == POSITION_ATTRIBUTE || name == NORMAL_ATTRIBUTE => {
                Err(SetupError::UnresolvedAttribute(name))
            }
            Err(name) => Err(SetupError::UnresolvedUniform(name)),
        }
    }

    /// Number of segments with uploaded geometry.
    pub fn segment_count(&self) -> usize {
        self.positions.len()
    }

    /// Draws `frames` in order.
    ///
    /// Every precondition is checked before the first draw is issued, so a frame
    /// either draws completely or not at all.
    pub fn render(&self, gfx: &mut G, frames: &[SegmentFrame]) -> Result<(), RenderError> {
        let Some(first) = frames.first() else {
            return Ok(());
        };

        let (mvp, normal_matrix) =
            self.locations
                .uniforms()
                .map_err(|name| RenderError::UnresolvedLocation {
                    segment: first.segment.name.clone(),
                    name,
                })?;

        if let Some(frame) = frames.iter().find(|f| f.index >= self.positions.len()) {
            return Err(RenderError::MissingGeometry {
                segment: frame.segment.name.clone(),
                index: frame.index,
            });
        }

        gfx.use_program(&self.program);
        for frame in frames {
            gfx.set_uniform_mat4(mvp, &frame.mvp);
            gfx.set_uniform_mat4(normal_matrix, &Mat4::from_mat3(frame.normal));
            gfx.bind_and_draw(
                &self.positions[frame.index],
                &self.normals,
                &self.indices,
                self.index_count,
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use crate::graphics::recording::{Call, RecordingContext};
    use crate::rig::Pose;
    use crate::segment::{JointAxis, Segment};
    use glam::{Mat3, Vec3};
    use pretty_assertions::assert_eq;

    fn chain() -> Chain {
        Chain::new(vec![
            Segment::new("base", Vec3::new(6.0, 0.5, 6.0)).fixed(),
            Segment::new("shaft", Vec3::new(2.0, 25.0, 2.0))
                .offset(Vec3::new(0.0, 10.0, 0.0))
                .rest_angle(90.0),
            Segment::new("rotor", Vec3::splat(1.5))
                .offset(Vec3::new(0.0, 2.0, 2.0))
                .axis(JointAxis::X)
                .clamped(60.0)
                .rest_angle(20.0),
        ])
    }

    #[test]
    fn uploads_shared_layout_then_one_box_per_segment() {
        let mut gfx = RecordingContext::default();
        let renderer = SegmentRenderer::upload(&mut gfx, &chain()).unwrap();

        assert_eq!(renderer.segment_count(), 3);
        assert_eq!(
            gfx.buffers,
            ["Box Normals", "Box Indices", "base", "shaft", "rotor"]
        );
        assert!(renderer.validate().is_ok());
    }

    #[test]
    fn one_draw_per_segment_in_chain_order() {
        let chain = chain();
        let mut gfx = RecordingContext::default();
        let renderer = SegmentRenderer::upload(&mut gfx, &chain).unwrap();
        let view_projection = Mat4::perspective_rh(0.8, 2.0, 0.1, 1000.0);
        let frames = evaluate(&chain, &Pose::rest(&chain), view_projection);

        renderer.render(&mut gfx, &frames).unwrap();

        let mut expected = vec![Call::UseProgram(0)];
        for (i, frame) in frames.iter().enumerate() {
            expected.push(Call::SetUniform(MVP_UNIFORM, frame.mvp));
            expected.push(Call::SetUniform(
                NORMAL_UNIFORM,
                Mat4::from_mat3(frame.normal),
            ));
            expected.push(Call::Draw {
                positions: 2 + i,
                normals: 0,
                indices: 1,
                index_count: 36,
            });
        }
        assert_eq!(gfx.calls, expected);
    }

    #[test]
    fn uploaded_normal_matrix_has_no_translation() {
        let chain = chain();
        let mut gfx = RecordingContext::default();
        let renderer = SegmentRenderer::upload(&mut gfx, &chain).unwrap();
        let frames = evaluate(&chain, &Pose::rest(&chain), Mat4::IDENTITY);

        renderer.render(&mut gfx, &frames).unwrap();

        for call in &gfx.calls {
            if let Call::SetUniform(NORMAL_UNIFORM, m) = call {
                assert_eq!(m.w_axis, glam::Vec4::W);
                assert!(Mat3::from_mat4(*m).determinant() > 0.0);
            }
        }
    }

    #[test]
    fn empty_frame_list_draws_nothing() {
        let mut gfx = RecordingContext::default();
        let renderer = SegmentRenderer::upload(&mut gfx, &Chain::default()).unwrap();

        renderer.render(&mut gfx, &[]).unwrap();

        assert!(gfx.calls.is_empty());
    }

    #[test]
    fn unresolved_uniform_is_a_setup_error() {
        let mut gfx = RecordingContext::without(&[NORMAL_UNIFORM]);
        let renderer = SegmentRenderer::upload(&mut gfx, &chain()).unwrap();

        assert!(matches!(
            renderer.validate(),
            Err(SetupError::UnresolvedUniform(NORMAL_UNIFORM))
        ));
    }

    #[test]
    fn unresolved_attribute_is_a_setup_error() {
        let mut gfx = RecordingContext::without(&[POSITION_ATTRIBUTE]);
        let renderer = SegmentRenderer::upload(&mut gfx, &chain()).unwrap();

        assert!(matches!(
            renderer.validate(),
            Err(SetupError::UnresolvedAttribute(POSITION_ATTRIBUTE))
        ));
    }

    #[test]
    fn refuses_to_draw_with_an_unresolved_location() {
        for missing in [POSITION_ATTRIBUTE, NORMAL_ATTRIBUTE, MVP_UNIFORM, NORMAL_UNIFORM] {
            let chain = chain();
            let mut gfx = RecordingContext::without(&[missing]);
            let renderer = SegmentRenderer::upload(&mut gfx, &chain).unwrap();
            let frames = evaluate(&chain, &Pose::rest(&chain), Mat4::IDENTITY);

            let err = renderer.render(&mut gfx, &frames).unwrap_err();

            assert!(
                matches!(err, RenderError::UnresolvedLocation { name, .. } if name == missing),
                "{missing}: {err}"
            );
            assert!(gfx.calls.is_empty(), "{missing}: draw issued anyway");
        }
    }

    #[test]
    fn refuses_frames_for_segments_without_geometry() {
        let short = Chain::new(chain().segments()[..1].to_vec());
        let long = chain();
        let mut gfx = RecordingContext::default();
        let renderer = SegmentRenderer::upload(&mut gfx, &short).unwrap();
        let frames = evaluate(&long, &Pose::rest(&long), Mat4::IDENTITY);

        let err = renderer.render(&mut gfx, &frames).unwrap_err();

        assert!(matches!(err, RenderError::MissingGeometry { index: 1, .. }));
        assert!(gfx.draws().is_empty());
    }

    #[test]
    fn compile_failure_stops_setup() {
        let mut gfx = RecordingContext {
            fail_compile: true,
            ..Default::default()
        };

        let result = SegmentRenderer::upload(&mut gfx, &chain());

        assert!(matches!(result, Err(SetupError::Program(_))));
        assert!(gfx.buffers.is_empty());
    }
}
