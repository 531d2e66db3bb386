/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;
use meshforge_core::{project_point, GlobalConstants, Mesh, ObjectConstants};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light every lit surface receives regardless of orientation
const AMBIENT: f32 = 0.1;

/// A projected vertex: screen x, screen y, depth, light intensity
type ScreenVertex = (f32, f32, f32, f32);

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at a cell, mostly for inspection in tests
    pub fn cell(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }

    /// Rasterize every triangle of `mesh` with per-vertex Lambert shading.
    ///
    /// Normals go to view space through `constants.invmv`; the light
    /// direction goes through `view`.
    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        constants: &ObjectConstants,
        globals: &GlobalConstants,
        view: &Matrix4<f32>,
    ) {
        let mvp = Matrix4::from(constants.mvp);
        let normal_matrix = Matrix4::from(constants.invmv);
        let light = (view * globals.light_direction().to_homogeneous())
            .xyz()
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);

        for [a, b, c] in mesh.triangles() {
            let corners = [a, b, c].map(|i| mesh.vertices()[i as usize]);

            // Meshes without normals fall back to the face normal
            let face_normal = (corners[1].position - corners[0].position)
                .cross(&(corners[2].position - corners[0].position));

            let mut screen = [(0.0, 0.0, 0.0, 0.0); 3];
            let mut visible = true;
            for (slot, vertex) in screen.iter_mut().zip(&corners) {
                let normal = if vertex.normal.norm_squared() > 0.0 {
                    vertex.normal
                } else {
                    face_normal
                };
                let view_normal = (normal_matrix * normal.to_homogeneous())
                    .xyz()
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector3::zeros);
                let intensity = AMBIENT + (1.0 - AMBIENT) * view_normal.dot(&light).max(0.0);

                match project_point(&mvp, &vertex.position, self.width as u32, self.height as u32) {
                    Some((x, y, z)) => *slot = (x, y, z, intensity),
                    None => {
                        visible = false;
                        break;
                    }
                }
            }

            if visible {
                self.rasterize_triangle(&screen);
            }
        }
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenVertex; 3]) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    let intensity = w0 * v0.3 + w1 * v1.3 + w2 * v2.3;
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = shade(intensity);
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Map a light intensity in [0, 1] onto the ramp, never blank for a covered cell
fn shade(intensity: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = (intensity.clamp(0.0, 1.0) * last as f32).round() as usize;
    LUMINOSITY_RAMP[index.clamp(1, last)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforge_core::{Camera, PrepareOptions, Transform};

    #[test]
    fn test_barycentric_corners() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (0.0, 0.0)).unwrap();
        assert!((w0 - 1.0).abs() < 1e-6 && w1.abs() < 1e-6 && w2.abs() < 1e-6);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }

    #[test]
    fn test_shade_covers_ramp() {
        assert_eq!(shade(0.0), '.');
        assert_eq!(shade(1.0), '@');
        assert_eq!(shade(2.0), '@');
    }

    #[test]
    fn test_cube_fills_screen_center() {
        let (width, height) = (40, 20);
        let mut camera = Camera::new(width, height);
        camera.zoom(100.0);

        let mut cube = Mesh::cube(1.0);
        cube.prepare(&PrepareOptions::default());

        let view = camera.view_matrix();
        let constants = ObjectConstants::compute(
            &Matrix4::identity(),
            &view,
            &camera.projection_matrix(),
            &Matrix4::identity(),
        );
        let globals = GlobalConstants::with_light(&camera.eye().coords);

        let mut renderer = AsciiRenderer::new(width as usize, height as usize);
        renderer.render_mesh(&cube, &constants, &globals, &view);

        // Face pointing straight at the camera and the light is fully lit
        assert_eq!(renderer.cell(20, 10), '@');
        assert_eq!(renderer.cell(0, 0), ' ');

        renderer.clear();
        assert_eq!(renderer.cell(20, 10), ' ');
    }

    #[test]
    fn test_offscreen_mesh_draws_nothing() {
        let camera = Camera::new(20, 10);
        let view = camera.view_matrix();
        let model = Transform::translation(&Vector3::new(0.0, 50.0, 0.0));
        let constants =
            ObjectConstants::compute(&model, &view, &camera.projection_matrix(), &model);

        let mut renderer = AsciiRenderer::new(20, 10);
        renderer.render_mesh(&Mesh::cube(1.0), &constants, &GlobalConstants::default(), &view);
        for y in 0..10 {
            for x in 0..20 {
                assert_eq!(renderer.cell(x, y), ' ');
            }
        }
    }
}
