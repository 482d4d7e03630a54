//! wgpu implementation of [`GraphicsContext`].
//!
//! [`MeshPass`] owns the [`GpuContext`] and turns the dispatcher's immediate-style
//! calls into one render pass per frame:
//!
//! - `set_uniform_mat4` fills a CPU-side [`SegmentUniforms`] block.
//! - `bind_and_draw` snapshots that block and queues the draw.
//! - [`MeshPass::present`] writes every snapshot into its own aligned slot of one
//!   uniform buffer, then replays the queue with dynamic offsets, so each draw sees
//!   its own matrices.
//!
//! # Bindings
//!
//! | Name              | Kind      | Where                          |
//! |-------------------|-----------|--------------------------------|
//! | `a_position`      | attribute | vertex buffer 0, location 0    |
//! | `a_normal`        | attribute | vertex buffer 1, location 1    |
//! | `u_mvp_matrix`    | uniform   | group 0 binding 0, offset 0    |
//! | `u_normal_matrix` | uniform   | group 0 binding 0, offset 64   |
//!
//! A name resolves only if the compiled program's source declares it.

use wgpu::util::DeviceExt;

use glam::Mat4;

use crate::error::{RenderError, SetupError};
use crate::gpu::GpuContext;
use crate::graphics::{
    GraphicsContext, MVP_UNIFORM, NORMAL_ATTRIBUTE, NORMAL_UNIFORM, POSITION_ATTRIBUTE,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Matrices uploaded for one draw.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SegmentUniforms {
    /// Combined view-projection-model matrix.
    pub mvp: [[f32; 4]; 4],
    /// Normal transform, widened to 4×4.
    pub normal_matrix: [[f32; 4]; 4],
}

const UNIFORM_SIZE: u64 = std::mem::size_of::<SegmentUniforms>() as u64;

/// Which matrix in [`SegmentUniforms`] a uniform name refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformSlot {
    Mvp,
    NormalMatrix,
}

/// A vertex shader input location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeSlot {
    pub shader_location: u32,
}

const ATTRIBUTES: [(&str, u32); 2] = [(POSITION_ATTRIBUTE, 0), (NORMAL_ATTRIBUTE, 1)];
const UNIFORMS: [(&str, UniformSlot); 2] = [
    (MVP_UNIFORM, UniformSlot::Mvp),
    (NORMAL_UNIFORM, UniformSlot::NormalMatrix),
];

const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

const NORMAL_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferId(usize);

struct Program {
    pipeline: wgpu::RenderPipeline,
    vertex_src: String,
    fragment_src: String,
}

impl Program {
    fn declares(&self, name: &str) -> bool {
        declares(&self.vertex_src, name) || declares(&self.fragment_src, name)
    }
}

struct QueuedDraw {
    program: Option<ProgramId>,
    positions: BufferId,
    normals: BufferId,
    indices: BufferId,
    index_count: u32,
    uniforms: SegmentUniforms,
}

/// Renders queued segment draws with depth testing into the window surface.
///
/// Pipeline: back-face culling with counter-clockwise front faces, opaque colour
/// writes, 32-bit float depth with a `Less` comparison.
pub struct MeshPass {
    gpu: GpuContext,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_capacity: usize,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    clear_color: wgpu::Color,
    programs: Vec<Program>,
    buffers: Vec<wgpu::Buffer>,
    active: Option<ProgramId>,
    pending: SegmentUniforms,
    queued: Vec<QueuedDraw>,
}

impl MeshPass {
    /// Creates the pass, taking ownership of the GPU context.
    pub fn new(gpu: GpuContext, clear_color: wgpu::Color) -> Self {
        let device = &gpu.device;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Segment Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Segment Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = wgpu::util::align_to(UNIFORM_SIZE, alignment);

        let uniform_capacity = 8;
        let (uniform_buffer, uniform_bind_group) =
            Self::create_uniforms(device, &uniform_layout, uniform_stride, uniform_capacity);

        let depth_view = Self::create_depth_view(&gpu);
        let depth_size = (gpu.width(), gpu.height());

        Self {
            gpu,
            pipeline_layout,
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_capacity,
            depth_view,
            depth_size,
            clear_color,
            programs: Vec::new(),
            buffers: Vec::new(),
            active: None,
            pending: bytemuck::Zeroable::zeroed(),
            queued: Vec::new(),
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Resizes the surface. The depth buffer follows on the next present.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    /// Drops any draws queued since the last present.
    pub fn discard_frame(&mut self) {
        self.queued.clear();
    }

    /// Number of draws waiting for [`present`](Self::present).
    pub fn queued_draws(&self) -> usize {
        self.queued.len()
    }

    /// Encodes every queued draw into one render pass and presents it.
    ///
    /// Returns the number of draws submitted. The queue is empty afterwards
    /// whether or not presenting succeeded.
    pub fn present(&mut self) -> Result<usize, RenderError> {
        let draws = std::mem::take(&mut self.queued);
        if draws.iter().any(|d| d.program.is_none()) {
            return Err(RenderError::NoProgram);
        }

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.gpu.reconfigure();
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        self.ensure_depth_size();
        self.ensure_uniform_capacity(draws.len());

        for (slot, draw) in draws.iter().enumerate() {
            self.gpu.queue.write_buffer(
                &self.uniform_buffer,
                slot as u64 * self.uniform_stride,
                bytemuck::bytes_of(&draw.uniforms),
            );
        }

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Segment Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Segment Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (slot, draw) in draws.iter().enumerate() {
                let Some(ProgramId(program)) = draw.program else {
                    continue;
                };
                let offset = (slot as u64 * self.uniform_stride) as u32;

                render_pass.set_pipeline(&self.programs[program].pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                render_pass.set_vertex_buffer(0, self.buffers[draw.positions.0].slice(..));
                render_pass.set_vertex_buffer(1, self.buffers[draw.normals.0].slice(..));
                render_pass.set_index_buffer(
                    self.buffers[draw.indices.0].slice(..),
                    wgpu::IndexFormat::Uint16,
                );
                render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(draws.len())
    }

    fn create_uniforms(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Segment Uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Segment Uniform Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(UNIFORM_SIZE),
                }),
            }],
        });

        (buffer, bind_group)
    }

    fn ensure_uniform_capacity(&mut self, slots: usize) {
        if slots <= self.uniform_capacity {
            return;
        }

        let capacity = slots.next_power_of_two();
        log::debug!("growing segment uniform buffer to {capacity} slots");
        let (buffer, bind_group) = Self::create_uniforms(
            &self.gpu.device,
            &self.uniform_layout,
            self.uniform_stride,
            capacity,
        );
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_capacity = capacity;
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn ensure_depth_size(&mut self) {
        let size = (self.gpu.width(), self.gpu.height());
        if self.depth_size != size {
            self.depth_view = Self::create_depth_view(&self.gpu);
            self.depth_size = size;
        }
    }

    fn create_pipeline(
        &self,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        self.gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Segment Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some("vs"),
                    buffers: &[POSITION_LAYOUT, NORMAL_LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn push_buffer(&mut self, buffer: wgpu::Buffer) -> BufferId {
        self.buffers.push(buffer);
        BufferId(self.buffers.len() - 1)
    }
}

impl GraphicsContext for MeshPass {
    type Program = ProgramId;
    type Buffer = BufferId;
    type AttributeLocation = AttributeSlot;
    type UniformLocation = UniformSlot;

    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramId, SetupError> {
        let device = &self.gpu.device;

        // Invalid WGSL or a mismatched interface surfaces as a validation error
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Segment Vertex Shader"),
            source: wgpu::ShaderSource::Wgsl(vertex_src.into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Segment Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(fragment_src.into()),
        });
        let pipeline = self.create_pipeline(&vertex, &fragment);

        if let Some(error) = pollster::block_on(self.gpu.device.pop_error_scope()) {
            return Err(SetupError::Program(error.to_string()));
        }

        self.programs.push(Program {
            pipeline,
            vertex_src: vertex_src.to_owned(),
            fragment_src: fragment_src.to_owned(),
        });
        Ok(ProgramId(self.programs.len() - 1))
    }

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        data: &[[f32; 3]],
    ) -> Result<BufferId, SetupError> {
        if data.is_empty() {
            return Err(SetupError::EmptyBuffer(label.to_owned()));
        }

        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(self.push_buffer(buffer))
    }

    fn create_index_buffer(&mut self, label: &str, indices: &[u16]) -> Result<BufferId, SetupError> {
        if indices.is_empty() {
            return Err(SetupError::EmptyBuffer(label.to_owned()));
        }

        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Ok(self.push_buffer(buffer))
    }

    fn resolve_attribute(&self, program: &ProgramId, name: &str) -> Option<AttributeSlot> {
        let program = self.programs.get(program.0)?;
        ATTRIBUTES
            .iter()
            .find(|(known, _)| *known == name && program.declares(name))
            .map(|&(_, shader_location)| AttributeSlot { shader_location })
    }

    fn resolve_uniform(&self, program: &ProgramId, name: &str) -> Option<UniformSlot> {
        let program = self.programs.get(program.0)?;
        UNIFORMS
            .iter()
            .find(|(known, _)| *known == name && program.declares(name))
            .map(|&(_, slot)| slot)
    }

    fn use_program(&mut self, program: &ProgramId) {
        self.active = Some(*program);
    }

    fn set_uniform_mat4(&mut self, location: UniformSlot, matrix: &Mat4) {
        let columns = matrix.to_cols_array_2d();
        match location {
            UniformSlot::Mvp => self.pending.mvp = columns,
            UniformSlot::NormalMatrix => self.pending.normal_matrix = columns,
        }
    }

    fn bind_and_draw(
        &mut self,
        positions: &BufferId,
        normals: &BufferId,
        indices: &BufferId,
        index_count: u32,
    ) {
        self.queued.push(QueuedDraw {
            program: self.active,
            positions: *positions,
            normals: *normals,
            indices: *indices,
            index_count,
            uniforms: self.pending,
        });
    }
}

/// True when `source` contains `name` as a whole identifier.
fn declares(source: &str, name: &str) -> bool {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    source.match_indices(name).any(|(at, _)| {
        let before = source[..at].chars().next_back();
        let after = source[at + name.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}
