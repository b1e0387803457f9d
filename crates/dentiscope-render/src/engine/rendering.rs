//! Per-frame GPU resources and draw recording.

use dentiscope_core::measure::{build_overlay, ScreenProjection};
use glam::Vec2;
use wgpu::util::DeviceExt;

use super::pipelines::{FlatUniforms, MeshUniforms};
use super::RenderEngine;
use crate::batch::{grid_lines, pixel_transform, point_sprites, FlatVertex, OverlayBatch};
use crate::camera::Camera;
use crate::frame::{FrameLabel, RenderScene, RenderSettings};

const AMBIENT: f32 = 0.25;
const DIFFUSE: f32 = 0.75;
const POINT_RADIUS: f32 = 1.5;

/// Model geometry uploaded once per frame and shared by every viewport.
pub struct SceneBuffers {
    model: Option<GpuModel>,
}

struct GpuModel {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

#[derive(Clone, Copy)]
enum FlatPass {
    Grid,
    Sprites,
    Overlay,
}

struct FlatDraw {
    pass: FlatPass,
    vertices: wgpu::Buffer,
    count: u32,
    bind_group: wgpu::BindGroup,
}

struct MeshDraw {
    blended: bool,
    bind_group: wgpu::BindGroup,
}

/// Everything one viewport draws, ready to be recorded into a render pass.
pub struct PreparedView {
    mesh: Option<MeshDraw>,
    grid: Option<FlatDraw>,
    sprites: Option<FlatDraw>,
    overlay: Option<FlatDraw>,
    /// Text the host draws on top of the frame.
    pub labels: Vec<FrameLabel>,
}

impl RenderEngine {
    /// Uploads the model of `scene`, if it is a visible triangle mesh.
    pub fn upload_scene(&self, scene: &RenderScene<'_>) -> SceneBuffers {
        let model = scene
            .model
            .filter(|m| !m.triangles.is_empty())
            .filter(|_| scene.appearance.visible && scene.appearance.opacity > 0.0)
            .map(|model| {
                let vertices = model.interleaved(scene.appearance.color);
                GpuModel {
                    vertices: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("model vertices"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    indices: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("model indices"),
                        contents: model.index_bytes(),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: (model.triangles.len() * 3) as u32,
                }
            });
        SceneBuffers { model }
    }

    fn flat_draw(
        &self,
        pass: FlatPass,
        vertices: &[FlatVertex],
        transform: glam::Mat4,
    ) -> Option<FlatDraw> {
        if vertices.is_empty() {
            return None;
        }
        let uniforms = FlatUniforms {
            transform: transform.to_cols_array_2d(),
        };
        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("flat uniforms"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flat bind group"),
            layout: &self.pipelines.flat_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let vertices_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("flat vertices"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Some(FlatDraw {
            pass,
            vertices: vertices_buffer,
            count: vertices.len() as u32,
            bind_group,
        })
    }

    /// Builds the draws of one `width` x `height` viewport seen through
    /// `camera`.
    pub fn prepare_view(
        &self,
        buffers: &SceneBuffers,
        camera: &Camera,
        scene: &RenderScene<'_>,
        settings: &RenderSettings,
        width: u32,
        height: u32,
    ) -> PreparedView {
        let mut camera = camera.clone();
        camera.set_aspect_ratio(width as f32 / height as f32);
        let view_proj = camera.view_projection_matrix();

        let grid = if settings.show_grid {
            self.flat_draw(FlatPass::Grid, &grid_lines(settings), view_proj)
        } else {
            None
        };

        let mesh = buffers.model.as_ref().map(|_| {
            let uniforms = MeshUniforms {
                view_proj: view_proj.to_cols_array_2d(),
                light: (-camera.forward()).extend(settings.light_intensity).to_array(),
                params: [scene.appearance.opacity, AMBIENT, DIFFUSE, 0.0],
            };
            let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh uniforms"),
                contents: bytemuck::cast_slice(&[uniforms]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            MeshDraw {
                blended: scene.appearance.opacity < 1.0,
                bind_group: self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("mesh bind group"),
                    layout: &self.pipelines.mesh_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    }],
                }),
            }
        });

        let sprites = scene
            .model
            .filter(|m| m.triangles.is_empty())
            .filter(|_| scene.appearance.visible && scene.appearance.opacity > 0.0)
            .and_then(|model| {
                let color = |i: usize| {
                    model
                        .colors
                        .as_ref()
                        .and_then(|c| c.get(i).copied())
                        .unwrap_or(scene.appearance.color)
                        * settings.light_intensity
                };
                let points = model.positions.iter().enumerate().map(|(i, p)| (*p, color(i)));
                let vertices = point_sprites(&view_proj, points, width, height, POINT_RADIUS);
                self.flat_draw(FlatPass::Sprites, &vertices, glam::Mat4::IDENTITY)
            });

        let mut overlay = OverlayBatch::new();
        if let Some(store) = scene.measurements {
            let projection = ScreenProjection::Camera {
                view_proj,
                viewport: Vec2::new(width as f32, height as f32),
            };
            for command in build_overlay(store, &projection, &settings.overlay_style) {
                overlay.push(command);
            }
        }
        if settings.show_crosshair {
            overlay.crosshair(width, height);
        }
        let OverlayBatch { vertices, labels } = overlay;

        PreparedView {
            mesh,
            grid,
            sprites,
            overlay: self.flat_draw(FlatPass::Overlay, &vertices, pixel_transform(width, height)),
            labels,
        }
    }

    fn record_flat(&self, pass: &mut wgpu::RenderPass<'_>, draw: &FlatDraw) {
        let pipeline = match draw.pass {
            FlatPass::Grid => &self.pipelines.grid,
            FlatPass::Sprites => &self.pipelines.sprites,
            FlatPass::Overlay => &self.pipelines.overlay,
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &draw.bind_group, &[]);
        pass.set_vertex_buffer(0, draw.vertices.slice(..));
        pass.draw(0..draw.count, 0..1);
    }

    /// Records one prepared viewport. The grid goes first so a translucent
    /// model blends over it; the overlay goes last.
    pub(crate) fn record_view(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        buffers: &SceneBuffers,
        view: &PreparedView,
    ) {
        if let Some(grid) = &view.grid {
            self.record_flat(pass, grid);
        }
        if let (Some(model), Some(mesh)) = (&buffers.model, &view.mesh) {
            let pipeline = if mesh.blended {
                &self.pipelines.mesh_blended
            } else {
                &self.pipelines.mesh_opaque
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &mesh.bind_group, &[]);
            pass.set_vertex_buffer(0, model.vertices.slice(..));
            pass.set_index_buffer(model.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..model.index_count, 0, 0..1);
        }
        if let Some(sprites) = &view.sprites {
            self.record_flat(pass, sprites);
        }
        if let Some(overlay) = &view.overlay {
            self.record_flat(pass, overlay);
        }
    }
}
