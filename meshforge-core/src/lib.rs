/// Meshforge Core Library - mesh ingestion and transform math
///
/// This library provides the stateless core of the renderer: OBJ import with
/// vertex deduplication, unit-cube normalization, tangent frame generation,
/// transformation and projection matrices, and the hand-off of finished
/// meshes to a buffer packer.

pub mod error;
pub mod geometry;
pub mod obj;
pub mod pack;
pub mod postprocess;
pub mod projection;
pub mod scene;
pub mod transform;
pub mod uniforms;

// Re-export commonly used types
pub use error::{Error, Result};
pub use geometry::{Mesh, Vertex};
pub use obj::{parse_obj, FaceIndexKey};
pub use pack::{BufferPacker, BufferUsage, GpuVertex, HostBuffer, HostPacker, MeshBuffers};
pub use postprocess::{load_prepared, DegenerateUvPolicy, Normalization, PrepareOptions};
pub use projection::{project_point, Camera, ProjectionMode};
pub use scene::{AssetKind, SceneObject, TextureBinding, TextureOptions, TextureSource};
pub use transform::Transform;
pub use uniforms::{GlobalConstants, MaterialConstants, ObjectConstants};
