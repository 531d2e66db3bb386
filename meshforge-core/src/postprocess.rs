/// Mesh post-processing: unit-cube normalization and tangent frames
///
/// Both passes mutate the mesh in place and never fail. Degenerate input
/// (coincident positions, collapsed UVs, missing normals) shows up as
/// zero or non-finite attributes; see [`Mesh::has_non_finite`].

use std::path::Path;

use log::{debug, warn};
use nalgebra::Vector3;

use crate::error::Result;
use crate::geometry::Mesh;

/// What to do with triangles whose UV mapping has a zero-area determinant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateUvPolicy {
    /// Divide anyway; affected vertices end up with NaN or infinite tangents
    #[default]
    Propagate,
    /// Leave such triangles out of the accumulation and give vertices that
    /// receive no contribution a zero tangent basis
    Skip,
}

/// Which post-processing passes run after import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOptions {
    pub normalize: bool,
    pub tangents: bool,
    pub degenerate_uv: DegenerateUvPolicy,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            tangents: true,
            degenerate_uv: DegenerateUvPolicy::default(),
        }
    }
}

/// The translation and scale removed by [`Mesh::center_and_unit`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub centroid: Vector3<f32>,
    /// Divisor applied to every recentered position; 1.0 for a zero-extent mesh
    pub extent: f32,
}

impl Mesh {
    /// Recenter positions on their mean and scale so the largest coordinate
    /// magnitude becomes 1.0
    pub fn center_and_unit(&mut self) -> Normalization {
        if self.vertices.is_empty() {
            return Normalization {
                centroid: Vector3::zeros(),
                extent: 1.0,
            };
        }

        let centroid = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |sum, v| sum + v.position.coords)
            / self.vertices.len() as f32;

        let mut max_extent = 0.0f32;
        for vertex in &mut self.vertices {
            vertex.position -= centroid;
            max_extent = max_extent.max(vertex.position.coords.amax());
        }

        let extent = if max_extent == 0.0 {
            warn!("mesh has zero extent, skipping unit scaling");
            1.0
        } else {
            max_extent
        };

        for vertex in &mut self.vertices {
            vertex.position /= extent;
        }

        debug!("normalized mesh: centroid {:?}, extent {}", centroid, extent);
        Normalization { centroid, extent }
    }

    /// Derive a per-vertex tangent and bitangent from positions and UVs.
    ///
    /// Face tangents are accumulated unnormalized so larger triangles weigh
    /// more at shared vertices. The tangent is then made orthogonal to the
    /// normal and flipped where needed so `cross(normal, tangent)` points
    /// along the bitangent. The bitangent is only normalized.
    pub fn compute_tangent_frame(&mut self, policy: DegenerateUvPolicy) {
        if self.indices.is_empty() || self.vertices.is_empty() {
            return;
        }

        let mut skipped = 0usize;
        for face in 0..self.indices.len() / 3 {
            let corners = [
                self.indices[3 * face] as usize,
                self.indices[3 * face + 1] as usize,
                self.indices[3 * face + 2] as usize,
            ];
            let v0 = &self.vertices[corners[0]];
            let v1 = &self.vertices[corners[1]];
            let v2 = &self.vertices[corners[2]];

            let delta_pos1 = v1.position - v0.position;
            let delta_pos2 = v2.position - v0.position;
            let delta_uv1 = v1.texcoord - v0.texcoord;
            let delta_uv2 = v2.texcoord - v0.texcoord;

            let det = 1.0 / (delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x);
            if policy == DegenerateUvPolicy::Skip && !det.is_finite() {
                skipped += 1;
                continue;
            }

            let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * det;
            let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * det;

            for index in corners {
                self.vertices[index].tangent += tangent;
                self.vertices[index].bitangent += bitangent;
            }
        }

        if skipped > 0 {
            warn!("skipped {} faces with degenerate texture coordinates", skipped);
        }

        let normalize: fn(Vector3<f32>) -> Vector3<f32> = match policy {
            DegenerateUvPolicy::Propagate => |v| v.normalize(),
            DegenerateUvPolicy::Skip => normalize_or_zero,
        };

        for vertex in &mut self.vertices {
            let normal = vertex.normal;
            vertex.tangent = normalize(vertex.tangent - normal * normal.dot(&vertex.tangent));
            if normal.cross(&vertex.tangent).dot(&vertex.bitangent) < 0.0 {
                vertex.tangent = -vertex.tangent;
            }
            vertex.bitangent = normalize(vertex.bitangent);
        }

        if self.has_non_finite() {
            warn!("tangent frame contains non-finite values");
        }
        debug!("computed tangent frame for {} vertices", self.vertices.len());
    }

    /// Run the enabled post-processing passes in their fixed order
    pub fn prepare(&mut self, options: &PrepareOptions) {
        if options.normalize {
            self.center_and_unit();
        }
        if options.tangents {
            self.compute_tangent_frame(options.degenerate_uv);
        }
    }
}

fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    v.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
}

/// Load an OBJ file and run post-processing before handing it out
pub fn load_prepared(path: impl AsRef<Path>, options: &PrepareOptions) -> Result<Mesh> {
    let mut mesh = Mesh::load_obj(path)?;
    mesh.prepare(options);
    Ok(mesh)
}
