/// Hand-off of finished meshes to a GPU (or any other) buffer allocator

use bytemuck::{Pod, Zeroable};
use log::debug;

use crate::error::{Error, Result};
use crate::geometry::{Mesh, Vertex};

/// Vertex layout shared with shaders: position, normal, tangent, bitangent, texcoord
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub texcoord: [f32; 2],
}

impl From<&Vertex> for GpuVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            position: v.position.coords.into(),
            normal: v.normal.into(),
            tangent: v.tangent.into(),
            bitangent: v.bitangent.into(),
            texcoord: v.texcoord.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

/// Allocates device-visible buffers initialized with the given bytes
pub trait BufferPacker {
    type Buffer;

    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8])
        -> Result<Self::Buffer>;

    /// Give back a buffer that will never be used, e.g. after a partial upload
    fn release(&mut self, _buffer: Self::Buffer) {}
}

/// Buffers holding one uploaded mesh, with element counts for draw calls
#[derive(Debug)]
pub struct MeshBuffers<B> {
    pub vertex_buffer: B,
    pub index_buffer: B,
    pub vertex_count: usize,
    pub index_count: usize,
}

impl Mesh {
    /// Vertices in the packed shader layout
    pub fn gpu_vertices(&self) -> Vec<GpuVertex> {
        self.vertices.iter().map(GpuVertex::from).collect()
    }

    /// Copy vertices and `u32` indices into buffers created by `packer`
    pub fn upload<P: BufferPacker>(&self, packer: &mut P) -> Result<MeshBuffers<P::Buffer>> {
        if self.is_empty() {
            return Err(Error::Upload("mesh has no triangles".to_string()));
        }

        let vertices = self.gpu_vertices();
        let vertex_buffer = packer.create_buffer(
            "mesh vertices",
            BufferUsage::Vertex,
            bytemuck::cast_slice(&vertices),
        )?;
        let index_buffer = match packer.create_buffer(
            "mesh indices",
            BufferUsage::Index,
            bytemuck::cast_slice(&self.indices),
        ) {
            Ok(buffer) => buffer,
            Err(e) => {
                packer.release(vertex_buffer);
                return Err(e);
            }
        };

        debug!(
            "uploaded {} vertices ({} bytes), {} indices",
            vertices.len(),
            std::mem::size_of_val(vertices.as_slice()),
            self.indices.len()
        );

        Ok(MeshBuffers {
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len(),
            index_count: self.indices.len(),
        })
    }
}

/// A buffer living in host memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBuffer {
    pub label: String,
    pub usage: BufferUsage,
    pub bytes: Vec<u8>,
}

impl HostBuffer {
    /// Reinterpret the contents as a sequence of `T`
    pub fn read<T: Pod>(&self) -> Vec<T> {
        self.bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }
}

/// Packer that keeps buffers in host memory, for headless use and tests
#[derive(Debug, Default)]
pub struct HostPacker {
    allocated: usize,
    limit: Option<usize>,
}

impl HostPacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail allocations once `limit` bytes have been handed out
    pub fn with_limit(limit: usize) -> Self {
        Self {
            allocated: 0,
            limit: Some(limit),
        }
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocated
    }
}

impl BufferPacker for HostPacker {
    type Buffer = HostBuffer;

    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> Result<Self::Buffer> {
        let total = self.allocated + contents.len();
        if let Some(limit) = self.limit {
            if total > limit {
                return Err(Error::Upload(format!(
                    "{} needs {} bytes, {} of {} already allocated",
                    label,
                    contents.len(),
                    self.allocated,
                    limit
                )));
            }
        }
        self.allocated = total;

        Ok(HostBuffer {
            label: label.to_string(),
            usage,
            bytes: contents.to_vec(),
        })
    }

    fn release(&mut self, buffer: Self::Buffer) {
        self.allocated = self.allocated.saturating_sub(buffer.bytes.len());
    }
}
