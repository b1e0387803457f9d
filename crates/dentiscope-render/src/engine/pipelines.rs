//! Render pipeline creation.

use std::num::NonZeroU64;

use dentiscope_mesh::MeshVertex;

use crate::batch::FlatVertex;

/// Depth format of every render target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];
const FLAT_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

/// GPU-side model shading parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Direction towards the light, intensity in `w`.
    pub light: [f32; 4],
    /// Opacity, ambient and diffuse terms.
    pub params: [f32; 4],
}

/// GPU-side transform for unlit batches.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FlatUniforms {
    pub transform: [[f32; 4]; 4],
}

/// Every pipeline a viewport draws with, built for one color format.
pub(crate) struct Pipelines {
    pub mesh_layout: wgpu::BindGroupLayout,
    pub flat_layout: wgpu::BindGroupLayout,
    /// Opaque model: depth written.
    pub mesh_opaque: wgpu::RenderPipeline,
    /// Translucent model: blended, depth tested but not written.
    pub mesh_blended: wgpu::RenderPipeline,
    /// World-space grid lines.
    pub grid: wgpu::RenderPipeline,
    /// Depth-tested point sprites.
    pub sprites: wgpu::RenderPipeline,
    /// Pixel-space overlay drawn over everything.
    pub overlay: wgpu::RenderPipeline,
}

fn uniform_layout(device: &wgpu::Device, label: &str, size: u64) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(size),
            },
            count: None,
        }],
    })
}

struct PipelineSpec<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    layout: &'a wgpu::PipelineLayout,
    vertex_layout: wgpu::VertexBufferLayout<'a>,
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn build(device: &wgpu::Device, format: wgpu::TextureFormat, spec: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(spec.layout),
        vertex: wgpu::VertexState {
            module: spec.shader,
            entry_point: Some("vs_main"),
            buffers: &[spec.vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: spec.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/mesh.wgsl").into()),
        });
        let flat_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flat shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/flat.wgsl").into()),
        });

        let mesh_layout = uniform_layout(
            device,
            "mesh bind group layout",
            std::mem::size_of::<MeshUniforms>() as u64,
        );
        let flat_layout = uniform_layout(
            device,
            "flat bind group layout",
            std::mem::size_of::<FlatUniforms>() as u64,
        );
        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh pipeline layout"),
            bind_group_layouts: &[&mesh_layout],
            push_constant_ranges: &[],
        });
        let flat_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flat pipeline layout"),
            bind_group_layouts: &[&flat_layout],
            push_constant_ranges: &[],
        });

        let mesh_vertices = || wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &MESH_ATTRIBUTES,
        };
        let flat_vertices = || wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<FlatVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &FLAT_ATTRIBUTES,
        };
        let mesh = |label, blend, depth_write| {
            build(
                device,
                format,
                PipelineSpec {
                    label,
                    shader: &mesh_shader,
                    layout: &mesh_pipeline_layout,
                    vertex_layout: mesh_vertices(),
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    blend,
                    depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                },
            )
        };
        let flat = |label, topology, blend, depth_write, depth_compare| {
            build(
                device,
                format,
                PipelineSpec {
                    label,
                    shader: &flat_shader,
                    layout: &flat_pipeline_layout,
                    vertex_layout: flat_vertices(),
                    topology,
                    blend,
                    depth_write,
                    depth_compare,
                },
            )
        };

        Self {
            mesh_opaque: mesh("mesh pipeline", wgpu::BlendState::REPLACE, true),
            mesh_blended: mesh("mesh blended pipeline", wgpu::BlendState::ALPHA_BLENDING, false),
            grid: flat(
                "grid pipeline",
                wgpu::PrimitiveTopology::LineList,
                wgpu::BlendState::REPLACE,
                true,
                wgpu::CompareFunction::Less,
            ),
            sprites: flat(
                "point sprite pipeline",
                wgpu::PrimitiveTopology::TriangleList,
                wgpu::BlendState::REPLACE,
                true,
                wgpu::CompareFunction::LessEqual,
            ),
            overlay: flat(
                "overlay pipeline",
                wgpu::PrimitiveTopology::TriangleList,
                wgpu::BlendState::ALPHA_BLENDING,
                false,
                wgpu::CompareFunction::Always,
            ),
            mesh_layout,
            flat_layout,
        }
    }
}
