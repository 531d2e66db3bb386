/// Geometry primitives: vertices and indexed triangle meshes
use nalgebra::{Point3, Vector2, Vector3};

use crate::error::{Error, Result};

/// A mesh vertex with position, normal, tangent basis and texture coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub tangent: Vector3<f32>,
    pub bitangent: Vector3<f32>,
    pub texcoord: Vector2<f32>,
}

impl Vertex {
    /// Create a vertex with an empty tangent basis
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            tangent: Vector3::zeros(),
            bitangent: Vector3::zeros(),
            texcoord,
        }
    }

    fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
            && self.normal.iter().all(|c| c.is_finite())
            && self.tangent.iter().all(|c| c.is_finite())
            && self.bitangent.iter().all(|c| c.is_finite())
            && self.texcoord.iter().all(|c| c.is_finite())
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Point3::origin(), Vector3::zeros(), Vector2::zeros())
    }
}

/// An indexed triangle mesh.
///
/// `indices.len()` is always a multiple of three and every index addresses
/// an element of `vertices`.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from existing buffers, checking the topology invariants
    pub fn from_parts(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        let mesh = Self { vertices, indices };
        mesh.validate()?;
        Ok(mesh)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over triangles as index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    /// Check that indices form whole triangles and stay within the vertex sequence
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(Error::InvalidTopology(format!(
                "{} indices do not form whole triangles",
                self.indices.len()
            )));
        }
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.vertices.len())
        {
            return Err(Error::InvalidTopology(format!(
                "index {} out of range for {} vertices",
                bad,
                self.vertices.len()
            )));
        }
        Ok(())
    }

    /// True if any vertex attribute is NaN or infinite.
    ///
    /// Post-processing never fails on degenerate geometry; callers that need
    /// clean data should check this before uploading.
    pub fn has_non_finite(&self) -> bool {
        self.vertices.iter().any(|v| !v.is_finite())
    }

    /// Axis-aligned bounds of all vertex positions, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (min.inf(&v.position), max.sup(&v.position))
        }))
    }

    /// Create a textured cube mesh for testing and as a fallback asset.
    ///
    /// Each face owns its four corners so normals and UVs stay sharp.
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        // (normal, u axis, v axis) with u x v == normal so faces wind CCW from outside
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut mesh = Self {
            vertices: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
        };

        for (normal, u, v) in faces {
            let normal = Vector3::from(normal);
            let u = Vector3::from(u);
            let v = Vector3::from(v);
            let base = mesh.vertices.len() as u32;

            for (su, sv) in corners {
                let position = Point3::from((normal + u * su + v * sv) * half);
                let texcoord = Vector2::new((su + 1.0) / 2.0, (sv + 1.0) / 2.0);
                mesh.vertices.push(Vertex::new(position, normal, texcoord));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_at(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::new(Point3::new(x, y, z), Vector3::z(), Vector2::zeros())
    }

    #[test]
    fn test_cube_topology() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube.validate().is_ok());

        let (min, max) = cube.bounds().unwrap();
        assert_eq!(min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let cube = Mesh::cube(1.0);
        for [a, b, c] in cube.triangles() {
            let v0 = cube.vertices()[a as usize];
            let v1 = cube.vertices()[b as usize];
            let v2 = cube.vertices()[c as usize];
            let face_normal = (v1.position - v0.position).cross(&(v2.position - v0.position));
            assert!(face_normal.dot(&v0.normal) > 0.0);
        }
    }

    #[test]
    fn test_from_parts_rejects_partial_triangle() {
        let vertices = vec![vertex_at(0.0, 0.0, 0.0), vertex_at(1.0, 0.0, 0.0)];
        let result = Mesh::from_parts(vertices, vec![0, 1]);
        assert!(matches!(result, Err(Error::InvalidTopology(_))));
    }

    #[test]
    fn test_from_parts_rejects_out_of_range_index() {
        let vertices = vec![
            vertex_at(0.0, 0.0, 0.0),
            vertex_at(1.0, 0.0, 0.0),
            vertex_at(0.0, 1.0, 0.0),
        ];
        let result = Mesh::from_parts(vertices, vec![0, 1, 3]);
        assert!(matches!(result, Err(Error::InvalidTopology(_))));
    }

    #[test]
    fn test_non_finite_detection() {
        let mut vertices = vec![
            vertex_at(0.0, 0.0, 0.0),
            vertex_at(1.0, 0.0, 0.0),
            vertex_at(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::from_parts(vertices.clone(), vec![0, 1, 2]).unwrap();
        assert!(!mesh.has_non_finite());

        vertices[1].tangent.x = f32::NAN;
        let mesh = Mesh::from_parts(vertices, vec![0, 1, 2]).unwrap();
        assert!(mesh.has_non_finite());
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        assert!(Mesh::new().bounds().is_none());
        assert!(Mesh::new().is_empty());
    }
}
