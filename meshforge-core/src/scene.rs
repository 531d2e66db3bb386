/// Renderable scene objects and the textures they expect the host to bind

use std::path::{Path, PathBuf};

use log::info;
use nalgebra::Matrix4;

use crate::error::Result;
use crate::geometry::Mesh;
use crate::pack::{BufferPacker, MeshBuffers};
use crate::postprocess::PrepareOptions;
use crate::projection::Camera;
use crate::uniforms::{MaterialConstants, ObjectConstants};

/// How six cubemap faces are arranged in a single image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeLayout {
    /// Faces stacked top to bottom
    Vertical,
}

/// Loading options the host should apply to a texture file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureOptions {
    pub generate_mipmaps: bool,
    pub srgb: bool,
    pub flip_vertically: bool,
    pub cube_layout: Option<CubeLayout>,
}

impl TextureOptions {
    pub fn flat() -> Self {
        Self {
            generate_mipmaps: true,
            srgb: false,
            flip_vertically: true,
            cube_layout: None,
        }
    }

    pub fn cubemap() -> Self {
        Self {
            cube_layout: Some(CubeLayout::Vertical),
            ..Self::flat()
        }
    }
}

/// What kind of asset an object is, with the texture set it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    /// Lit, normal-mapped and shadowed surface
    Lit {
        color: PathBuf,
        normal: PathBuf,
        shininess: i32,
    },
    /// Environment box sampled from a cubemap
    Skybox { cubemap: PathBuf },
}

impl AssetKind {
    /// `<dir>/<name>_texture_color.png` and `<dir>/<name>_texture_normal.png`
    pub fn lit(dir: impl AsRef<Path>, name: &str, shininess: i32) -> Self {
        let dir = dir.as_ref();
        Self::Lit {
            color: dir.join(format!("{name}_texture_color.png")),
            normal: dir.join(format!("{name}_texture_normal.png")),
            shininess,
        }
    }

    /// `<dir>/<name>.png` holding vertically stacked cube faces
    pub fn skybox(dir: impl AsRef<Path>, name: &str) -> Self {
        Self::Skybox {
            cubemap: dir.as_ref().join(format!("{name}.png")),
        }
    }
}

/// Where a bound texture comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    File {
        path: PathBuf,
        options: TextureOptions,
    },
    /// The shadow map rendered earlier in the frame
    ShadowMap,
}

/// A texture to bind at a fragment stage slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub slot: u32,
    pub source: TextureSource,
}

/// A prepared mesh with its placement, textures and per-frame constants
#[derive(Debug, Clone)]
pub struct SceneObject {
    name: String,
    kind: AssetKind,
    mesh: Mesh,
    pub model: Matrix4<f32>,
    constants: ObjectConstants,
}

impl SceneObject {
    /// Wrap an already prepared mesh
    pub fn new(name: impl Into<String>, mesh: Mesh, kind: AssetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            mesh,
            model: Matrix4::identity(),
            constants: ObjectConstants::default(),
        }
    }

    /// Load `<dir>/<name>.obj` and run post-processing on it
    pub fn load(
        dir: impl AsRef<Path>,
        name: &str,
        kind: AssetKind,
        options: &PrepareOptions,
    ) -> Result<Self> {
        let path = dir.as_ref().join(format!("{name}.obj"));
        let mut mesh = Mesh::load_obj(&path)?;
        mesh.prepare(options);
        info!(
            "loaded {}: {} vertices, {} triangles",
            name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(Self::new(name, mesh, kind))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AssetKind {
        &self.kind
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn constants(&self) -> &ObjectConstants {
        &self.constants
    }

    pub fn material(&self) -> MaterialConstants {
        match self.kind {
            AssetKind::Lit { shininess, .. } => MaterialConstants { shininess },
            AssetKind::Skybox { .. } => MaterialConstants::default(),
        }
    }

    /// Recompute this frame's transformation matrices
    pub fn update(&mut self, camera: &Camera, view_projection_light: &Matrix4<f32>) {
        self.constants = ObjectConstants::compute(
            &self.model,
            &camera.view_matrix(),
            &camera.projection_matrix(),
            view_projection_light,
        );
    }

    /// Textures the fragment stage expects, by slot
    pub fn texture_bindings(&self) -> Vec<TextureBinding> {
        match &self.kind {
            AssetKind::Lit { color, normal, .. } => vec![
                TextureBinding {
                    slot: 0,
                    source: TextureSource::File {
                        path: color.clone(),
                        options: TextureOptions::flat(),
                    },
                },
                TextureBinding {
                    slot: 1,
                    source: TextureSource::File {
                        path: normal.clone(),
                        options: TextureOptions::flat(),
                    },
                },
                TextureBinding {
                    slot: 2,
                    source: TextureSource::ShadowMap,
                },
            ],
            AssetKind::Skybox { cubemap } => vec![TextureBinding {
                slot: 0,
                source: TextureSource::File {
                    path: cubemap.clone(),
                    options: TextureOptions::cubemap(),
                },
            }],
        }
    }

    /// Skyboxes never cast shadows
    pub fn casts_shadow(&self) -> bool {
        matches!(self.kind, AssetKind::Lit { .. })
    }

    pub fn upload<P: BufferPacker>(&self, packer: &mut P) -> Result<MeshBuffers<P::Buffer>> {
        self.mesh.upload(packer)
    }
}
