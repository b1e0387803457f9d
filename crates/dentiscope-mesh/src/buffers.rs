//! Indexed triangle buffers shared by the parsers, normalizer and writers.

use glam::Vec3;

use crate::bounds::Aabb;

/// Interleaved vertex layout for GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// Vertex positions plus triangle indices, with optional normals and colors.
///
/// `normals` is either empty or has one entry per vertex; the same holds for
/// `colors` when present. An empty `triangles` list is a point set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub colors: Option<Vec<Vec3>>,
}

impl MeshBuffers {
    /// Creates buffers from positions and triangles.
    #[must_use]
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            normals: Vec::new(),
            triangles,
            colors: None,
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if there are vertices but no faces.
    #[must_use]
    pub fn is_point_set(&self) -> bool {
        self.triangles.is_empty() && !self.positions.is_empty()
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// Corner positions of one triangle.
    #[must_use]
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[index];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Unit normal of one triangle (zero for degenerate triangles).
    #[must_use]
    pub fn face_normal(&self, index: usize) -> Vec3 {
        let [v0, v1, v2] = self.triangle(index);
        (v1 - v0).cross(v2 - v0).normalize_or_zero()
    }

    /// Checks that every index refers to an existing vertex and the optional
    /// attribute arrays match the vertex count.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.positions.len();
        if let Some(bad) = self
            .triangles
            .iter()
            .flatten()
            .find(|&&i| i as usize >= n)
        {
            return Err(format!("face index {bad} out of range for {n} vertices"));
        }
        if !self.normals.is_empty() && self.normals.len() != n {
            return Err(format!("{} normals for {n} vertices", self.normals.len()));
        }
        if let Some(colors) = &self.colors {
            if colors.len() != n {
                return Err(format!("{} colors for {n} vertices", colors.len()));
            }
        }
        if self.positions.iter().any(|p| !p.is_finite()) {
            return Err("non-finite vertex coordinate".to_string());
        }
        Ok(())
    }

    /// Recomputes vertex normals as the area-weighted average of incident
    /// face normals. Point sets get no normals.
    pub fn compute_vertex_normals(&mut self) {
        self.normals.clear();
        if self.triangles.is_empty() {
            return;
        }
        self.normals.resize(self.positions.len(), Vec3::ZERO);
        for tri in &self.triangles {
            let v0 = self.positions[tri[0] as usize];
            let v1 = self.positions[tri[1] as usize];
            let v2 = self.positions[tri[2] as usize];
            // Cross product length is twice the area, so this is already area-weighted.
            let weighted = (v1 - v0).cross(v2 - v0);
            for &vi in tri {
                self.normals[vi as usize] += weighted;
            }
        }
        for normal in &mut self.normals {
            *normal = normal.normalize_or_zero();
        }
    }

    /// Applies an affine map `p * scale + offset` to every position.
    /// Normals are unchanged since the map is a uniform scale plus translation.
    #[must_use]
    pub fn scaled(mut self, scale: f32, offset: Vec3) -> Self {
        for p in &mut self.positions {
            *p = *p * scale + offset;
        }
        self
    }

    /// Concatenates several meshes into one, offsetting indices.
    ///
    /// Colors survive only if every part has them. Normals survive only if
    /// every part has them.
    #[must_use]
    pub fn merge<'a>(parts: impl IntoIterator<Item = &'a MeshBuffers>) -> Self {
        let parts: Vec<&MeshBuffers> = parts.into_iter().collect();
        let keep_colors = !parts.is_empty() && parts.iter().all(|p| p.colors.is_some());
        let keep_normals = parts
            .iter()
            .all(|p| p.normals.len() == p.positions.len());

        let mut merged = MeshBuffers::default();
        let mut colors = Vec::new();
        for part in parts {
            let base = merged.positions.len() as u32;
            merged.positions.extend_from_slice(&part.positions);
            merged
                .triangles
                .extend(part.triangles.iter().map(|t| t.map(|i| i + base)));
            if keep_normals {
                merged.normals.extend_from_slice(&part.normals);
            }
            if let (true, Some(c)) = (keep_colors, &part.colors) {
                colors.extend_from_slice(c);
            }
        }
        if keep_colors {
            merged.colors = Some(colors);
        }
        merged
    }

    /// Builds the interleaved vertex array. Missing normals become zero and
    /// missing colors become `fallback`.
    #[must_use]
    pub fn interleaved(&self, fallback: Vec3) -> Vec<MeshVertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| MeshVertex {
                position: p.to_array(),
                normal: self.normals.get(i).copied().unwrap_or(Vec3::ZERO).to_array(),
                color: self
                    .colors
                    .as_ref()
                    .and_then(|c| c.get(i).copied())
                    .unwrap_or(fallback)
                    .to_array(),
            })
            .collect()
    }

    /// Triangle indices as a flat array, e.g. for an index buffer.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }
}
