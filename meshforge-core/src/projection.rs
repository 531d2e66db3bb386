/// Orbit camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::transform::Transform;

/// Radians of orbit per unit of pointer movement, and radius change per unit of zoom
const ORBIT_SPEED: f32 = 0.01;
/// Pitch stays just short of the poles so `up` never aligns with the view direction
const MAX_PITCH: f32 = 1.57;
const MIN_RADIUS: f32 = 0.01;
const MAX_RADIUS: f32 = 8.0;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera orbiting a target point at a given radius
#[derive(Debug, Clone)]
pub struct Camera {
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
    yaw: f32,
    pitch: f32,
    radius: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: Point3::origin(),
            up: Vector3::y(),
            fov: 1.3,
            aspect: width as f32 / height.max(1) as f32,
            near: 0.01,
            far: 100.0,
            mode: ProjectionMode::Perspective,
            yaw: 0.0,
            pitch: 0.0,
            radius: 3.0,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Current eye position on the orbit sphere
    pub fn eye(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vector3::new(cos_pitch * cos_yaw, sin_pitch, -cos_pitch * sin_yaw) * self.radius
    }

    /// Orbit by a pointer delta; pitch is clamped short of the poles
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * ORBIT_SPEED;
        self.pitch = (self.pitch - dy * ORBIT_SPEED).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move towards (negative) or away from (positive) the target
    pub fn zoom(&mut self, amount: f32) {
        self.radius = (self.radius + amount * ORBIT_SPEED).clamp(MIN_RADIUS, MAX_RADIUS);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Transform::look_at(&self.eye(), &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Transform::perspective(self.fov, self.aspect, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = self.radius;
                let width = height * self.aspect;
                Transform::orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a 3D point to 2D screen space
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        project_point(&(self.view_projection() * model_matrix), point, width, height)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Project a point through a full model-view-projection matrix.
///
/// Returns screen x, y (origin top-left) and NDC depth, or `None` when the
/// point is behind the camera or outside the clip volume.
pub fn project_point(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = mvp * point.to_homogeneous();

    // Prevent division by near-zero w (points on or behind the eye plane)
    if clip.w < 1e-6 {
        return None;
    }

    let ndc = clip.xyz() / clip.w;
    if ndc.iter().any(|c| c.abs() > 1.0) {
        return None;
    }

    let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

    Some((screen_x, screen_y, ndc.z))
}
