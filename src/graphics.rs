//! The boundary between the pose pipeline and a graphics API.
//!
//! [`GraphicsContext`] is the small set of operations the dispatcher needs: compile
//! a program, upload buffers, look up where named inputs live, set matrices, and
//! draw. [`MeshPass`](crate::MeshPass) implements it on wgpu. Tests implement it
//! with a recorder that never touches a GPU.
//!
//! Locations are looked up by name and may be absent. Callers decide what an
//! absent location means. The dispatcher refuses to draw.

use glam::Mat4;

use crate::error::SetupError;

/// Name of the per-vertex position input.
pub const POSITION_ATTRIBUTE: &str = "a_position";
/// Name of the per-vertex normal input.
pub const NORMAL_ATTRIBUTE: &str = "a_normal";
/// Name of the combined view-projection-model matrix.
pub const MVP_UNIFORM: &str = "u_mvp_matrix";
/// Name of the normal transform.
pub const NORMAL_UNIFORM: &str = "u_normal_matrix";

/// Operations a rendering backend must provide.
///
/// Handles are backend-defined. Buffer data is written once at setup and never
/// modified, so handles can be reused freely across draws.
pub trait GraphicsContext {
    type Program;
    type Buffer;
    type AttributeLocation: Copy + std::fmt::Debug;
    type UniformLocation: Copy + std::fmt::Debug;

    /// Compiles and links a vertex/fragment program.
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self::Program, SetupError>;

    /// Uploads per-vertex 3-component data (positions or normals).
    fn create_vertex_buffer(
        &mut self,
        label: &str,
        data: &[[f32; 3]],
    ) -> Result<Self::Buffer, SetupError>;

    /// Uploads triangle-list indices.
    fn create_index_buffer(&mut self, label: &str, indices: &[u16])
    -> Result<Self::Buffer, SetupError>;

    fn resolve_attribute(
        &self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::AttributeLocation>;

    fn resolve_uniform(&self, program: &Self::Program, name: &str)
    -> Option<Self::UniformLocation>;

    /// Selects the program subsequent draws use.
    fn use_program(&mut self, program: &Self::Program);

    /// Sets a matrix uniform for the next draw.
    fn set_uniform_mat4(&mut self, location: Self::UniformLocation, matrix: &Mat4);

    /// Binds the vertex streams and index buffer and issues one indexed draw.
    fn bind_and_draw(
        &mut self,
        positions: &Self::Buffer,
        normals: &Self::Buffer,
        indices: &Self::Buffer,
        index_count: u32,
    );
}

#[cfg(test)]
pub(crate) mod recording {
    //! A [`GraphicsContext`] that records calls instead of drawing.

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Call {
        UseProgram(usize),
        SetUniform(&'static str, Mat4),
        Draw {
            positions: usize,
            normals: usize,
            indices: usize,
            index_count: u32,
        },
    }

    /// Records every call. Names listed in `missing` fail to resolve.
    #[derive(Default)]
    pub struct RecordingContext {
        pub calls: Vec<Call>,
        pub buffers: Vec<String>,
        pub programs: usize,
        pub missing: Vec<&'static str>,
        pub fail_compile: bool,
    }

    impl RecordingContext {
        pub fn without(names: &[&'static str]) -> Self {
            Self {
                missing: names.to_vec(),
                ..Default::default()
            }
        }

        pub fn draws(&self) -> Vec<&Call> {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Draw { .. }))
                .collect()
        }

        fn lookup(&self, name: &str) -> Option<&'static str> {
            [
                POSITION_ATTRIBUTE,
                NORMAL_ATTRIBUTE,
                MVP_UNIFORM,
                NORMAL_UNIFORM,
            ]
            .into_iter()
            .find(|known| *known == name && !self.missing.contains(known))
        }
    }

    impl GraphicsContext for RecordingContext {
        type Program = usize;
        type Buffer = usize;
        type AttributeLocation = &'static str;
        type UniformLocation = &'static str;

        fn compile_program(&mut self, _: &str, _: &str) -> Result<usize, SetupError> {
            if self.fail_compile {
                return Err(SetupError::Program("rejected by test".into()));
            }
            self.programs += 1;
            Ok(self.programs - 1)
        }

        fn create_vertex_buffer(
            &mut self,
            label: &str,
            data: &[[f32; 3]],
        ) -> Result<usize, SetupError> {
            if data.is_empty() {
                return Err(SetupError::EmptyBuffer(label.into()));
            }
            self.buffers.push(label.into());
            Ok(self.buffers.len() - 1)
        }

        fn create_index_buffer(&mut self, label: &str, indices: &[u16]) -> Result<usize, SetupError> {
            if indices.is_empty() {
                return Err(SetupError::EmptyBuffer(label.into()));
            }
            self.buffers.push(label.into());
            Ok(self.buffers.len() - 1)
        }

        fn resolve_attribute(&self, _: &usize, name: &str) -> Option<&'static str> {
            self.lookup(name)
        }

        fn resolve_uniform(&self, _: &usize, name: &str) -> Option<&'static str> {
            self.lookup(name)
        }

        fn use_program(&mut self, program: &usize) {
            self.calls.push(Call::UseProgram(*program));
        }

        fn set_uniform_mat4(&mut self, location: &'static str, matrix: &Mat4) {
            self.calls.push(Call::SetUniform(location, *matrix));
        }

        fn bind_and_draw(&mut self, positions: &usize, normals: &usize, indices: &usize, index_count: u32) {
            self.calls.push(Call::Draw {
                positions: *positions,
                normals: *normals,
                indices: *indices,
                index_count,
            });
        }
    }
}
