/// Terminal host for prepared meshes: ASCII rasterizer plus an orbit viewer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use log::info;
use nalgebra::{Matrix4, Point3, Vector3};
use std::fmt::Write as _;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use meshforge_core::{Camera, GlobalConstants, HostPacker, ProjectionMode, SceneObject, Transform};

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: u32 = 2;
/// Pointer-equivalent units per key press for orbit and zoom
const ORBIT_STEP: f32 = 10.0;
const ZOOM_STEP: f32 = 20.0;

/// Viewer settings taken from the command line
#[derive(Debug, Clone, Copy)]
pub struct ViewerConfig {
    pub fps: u32,
    /// Radians per frame the model spins around +Y
    pub spin: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            spin: 0.02,
        }
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    object: SceneObject,
    camera: Camera,
    globals: GlobalConstants,
    light_view_projection: Matrix4<f32>,
    renderer: AsciiRenderer,
    config: ViewerConfig,
    angle: f32,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(object: SceneObject, config: ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let light = Vector3::new(1.0, 2.0, 3.0);

        Ok(Self {
            object,
            camera: Camera::new(width as u32, height as u32 * CELL_ASPECT),
            globals: GlobalConstants::with_light(&light),
            light_view_projection: light_view_projection(&light),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            config,
            angle: 0.0,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        info!("viewer closed after {:.1} fps", self.fps);
        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / u64::from(self.config.fps.max(1)));

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.update();
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                KeyCode::Char('w') | KeyCode::Up => self.camera.orbit(0.0, -ORBIT_STEP),
                KeyCode::Char('s') | KeyCode::Down => self.camera.orbit(0.0, ORBIT_STEP),
                KeyCode::Char('a') | KeyCode::Left => self.camera.orbit(ORBIT_STEP, 0.0),
                KeyCode::Char('d') | KeyCode::Right => self.camera.orbit(-ORBIT_STEP, 0.0),
                KeyCode::Char('+') | KeyCode::Char('=') => self.camera.zoom(-ZOOM_STEP),
                KeyCode::Char('-') => self.camera.zoom(ZOOM_STEP),
                KeyCode::Char('p') => {
                    self.camera.mode = match self.camera.mode {
                        ProjectionMode::Perspective => ProjectionMode::Orthographic,
                        ProjectionMode::Orthographic => ProjectionMode::Perspective,
                    }
                }
                _ => {}
            },
            Event::Resize(width, height) => {
                self.camera.resize(width as u32, height as u32 * CELL_ASPECT);
                self.renderer.resize(width as usize, height as usize);
            }
            _ => {}
        }
    }

    fn update(&mut self) {
        self.angle += self.config.spin;
        self.object.model = Transform::model(1.0, &Vector3::zeros(), self.angle, &Vector3::y());
        self.object.update(&self.camera, &self.light_view_projection);
    }

    fn render(&mut self) -> io::Result<()> {
        self.renderer.clear();
        self.renderer.render_mesh(
            self.object.mesh(),
            self.object.constants(),
            &self.globals,
            &self.camera.view_matrix(),
        );

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "{} | {} tris | FPS: {:.1} | WASD/Arrows=Orbit +/-=Zoom P=Projection Q=Quit",
                self.object.name(),
                self.object.mesh().triangle_count(),
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Orthographic view-projection of a directional light covering the unit cube
pub fn light_view_projection(direction: &Vector3<f32>) -> Matrix4<f32> {
    let eye = Point3::from(direction.normalize() * 3.0);
    let view = Transform::look_at(&eye, &Point3::origin(), &Vector3::y());
    let projection = Transform::orthographic(-2.0, 2.0, -2.0, 2.0, 0.1, 6.0);
    projection * view
}

/// Human-readable report of a prepared object, packing it into host memory
pub fn summary(object: &SceneObject) -> meshforge_core::Result<String> {
    let mesh = object.mesh();
    let mut packer = HostPacker::new();
    let buffers = object.upload(&mut packer)?;

    let mut out = String::new();
    let _ = writeln!(out, "{}", object.name());
    let _ = writeln!(out, "  vertices:  {}", mesh.vertex_count());
    let _ = writeln!(out, "  triangles: {}", mesh.triangle_count());
    if let Some((min, max)) = mesh.bounds() {
        let _ = writeln!(
            out,
            "  bounds:    {:?} .. {:?}",
            min.coords.as_slice(),
            max.coords.as_slice()
        );
    }
    let _ = writeln!(out, "  non-finite attributes: {}", mesh.has_non_finite());
    let _ = writeln!(
        out,
        "  packed:    {} vertex bytes, {} index bytes",
        buffers.vertex_buffer.bytes.len(),
        buffers.index_buffer.bytes.len()
    );

    let _ = writeln!(out, "  shininess: {}", object.material().shininess);
    let _ = writeln!(out, "  casts shadow: {}", object.casts_shadow());
    for binding in object.texture_bindings() {
        let _ = writeln!(out, "  texture {}: {:?}", binding.slot, binding.source);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforge_core::{AssetKind, Mesh};

    #[test]
    fn test_summary_reports_material_and_shadow() {
        let lit = SceneObject::new("cube", Mesh::cube(2.0), AssetKind::lit("", "cube", 16));
        let report = summary(&lit).unwrap();
        assert!(report.starts_with("cube\n"));
        assert!(report.contains("  vertices:  24\n"));
        assert!(report.contains("  triangles: 12\n"));
        assert!(report.contains("  packed:    1344 vertex bytes, 144 index bytes\n"));
        assert!(report.contains("  shininess: 16\n"));
        assert!(report.contains("  casts shadow: true\n"));
        assert!(report.contains("  texture 2: ShadowMap\n"));

        let sky = SceneObject::new("sky", Mesh::cube(2.0), AssetKind::skybox("", "sky"));
        let report = summary(&sky).unwrap();
        assert!(report.contains("  casts shadow: false\n"));
        assert!(!report.contains("ShadowMap"));
    }

    #[test]
    fn test_summary_of_empty_object_fails() {
        let empty = SceneObject::new("empty", Mesh::new(), AssetKind::skybox("", "empty"));
        assert!(summary(&empty).is_err());
    }

    #[test]
    fn test_light_view_projection_contains_unit_cube() {
        let vp = light_view_projection(&Vector3::new(1.0, 2.0, 3.0));
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    let p = vp.transform_point(&Point3::new(x, y, z));
                    assert!(p.iter().all(|c| c.abs() <= 1.0), "{:?} outside", p);
                }
            }
        }
    }
}
