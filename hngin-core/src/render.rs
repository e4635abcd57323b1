/// Painter's-algorithm rendering of meshes and scenes
use nalgebra::Point3;

use crate::color::{illuminate, Rgb};
use crate::geometry::{Edge, Face, Mesh, PointExt, Vertex};
use crate::projection::Projector;
use crate::raster::FrameBuffer;
use crate::scene::Scene;
use crate::settings::Settings;

/// How primitives from different models are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthPolicy {
    /// Models in submission order, each drawing its own faces then vertices
    PerModel,
    /// Faces of every model pooled and drawn farthest first
    #[default]
    Global,
}

/// Options that shape one frame's draw calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub policy: DepthPolicy,
    /// Vertex dot radius; 0 hides vertices
    pub vertex_size: u32,
    pub vertex_color: Rgb,
    pub hollow_faces: bool,
    /// Light intensity for inverse-square face tinting
    pub illumination: Option<f64>,
}

impl RenderOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            policy: if settings.depth_sort {
                DepthPolicy::Global
            } else {
                DepthPolicy::PerModel
            },
            vertex_size: settings.vertex_size,
            vertex_color: Rgb::WHITE,
            hollow_faces: settings.hollow_faces,
            illumination: settings.direct_illumination.then_some(settings.light_intensity),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Counts of what a render pass drew and dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub faces: usize,
    pub edges: usize,
    pub points: usize,
    /// Primitives skipped because some vertex was behind the camera
    pub culled: usize,
}

struct Painter<'a, F> {
    projector: &'a Projector,
    options: &'a RenderOptions,
    target: &'a mut F,
    stats: RenderStats,
}

impl<F: FrameBuffer> Painter<'_, F> {
    fn face(&mut self, face: &Face, vertices: &[Vertex]) {
        let Some(corners) = self.projector.project_all(face.positions(vertices)) else {
            self.stats.culled += 1;
            return;
        };

        let color = match self.options.illumination {
            Some(intensity) => {
                let distance = face.center(vertices).distance_to(&self.projector.origin());
                illuminate(face.color, intensity, distance)
            }
            None => face.color,
        };

        self.target.triangle(corners, color, !self.options.hollow_faces);
        self.stats.faces += 1;
    }

    fn edge(&mut self, edge: &Edge, vertices: &[Vertex], color: Rgb) {
        let [a, b] = edge.vertices.map(|i| &vertices[i]);
        match self.projector.project_all([a, b]) {
            Some([from, to]) => {
                self.target.line(from, to, color);
                self.stats.edges += 1;
            }
            None => self.stats.culled += 1,
        }
    }

    fn vertex(&mut self, vertex: &Vertex) {
        if let Some(center) = self.projector.project(vertex) {
            self.target.point(center, self.options.vertex_size, self.options.vertex_color);
            self.stats.points += 1;
        }
    }

    fn vertices_enabled(&self) -> bool {
        self.options.vertex_size > 0
    }
}

impl Mesh {
    /// Draw this mesh on its own: faces (or edges when there are no faces)
    /// in stored order, then vertex dots.
    pub fn render<F: FrameBuffer>(
        &self,
        projector: &Projector,
        options: &RenderOptions,
        target: &mut F,
    ) -> RenderStats {
        let mut painter = Painter {
            projector,
            options,
            target,
            stats: RenderStats::default(),
        };
        self.paint(&mut painter);
        painter.stats
    }

    fn paint<F: FrameBuffer>(&self, painter: &mut Painter<'_, F>) {
        if !self.faces.is_empty() {
            for face in &self.faces {
                painter.face(face, &self.vertices);
            }
        } else {
            for edge in &self.edges {
                painter.edge(edge, &self.vertices, self.color);
            }
        }

        if painter.vertices_enabled() {
            for vertex in &self.vertices {
                painter.vertex(vertex);
            }
        }
    }
}

/// A face or edge pooled for global sorting
enum Primitive<'a> {
    Face(&'a Face),
    Edge(&'a Edge, Rgb),
}

struct Pooled<'a> {
    primitive: Primitive<'a>,
    vertices: &'a [Vertex],
    distance: f64,
}

impl Scene {
    /// Draw every model with the selected depth policy
    pub fn render<F: FrameBuffer>(
        &self,
        projector: &Projector,
        options: &RenderOptions,
        target: &mut F,
    ) -> RenderStats {
        let mut painter = Painter {
            projector,
            options,
            target,
            stats: RenderStats::default(),
        };

        match options.policy {
            DepthPolicy::PerModel => {
                for model in &self.models {
                    model.mesh().paint(&mut painter);
                }
            }
            DepthPolicy::Global => self.paint_sorted(&mut painter),
        }

        painter.stats
    }

    fn paint_sorted<F: FrameBuffer>(&self, painter: &mut Painter<'_, F>) {
        let eye = painter.projector.origin();
        let pooled = self.pool(&eye);

        for item in &pooled {
            match item.primitive {
                Primitive::Face(face) => painter.face(face, item.vertices),
                Primitive::Edge(edge, color) => painter.edge(edge, item.vertices, color),
            }
        }

        if painter.vertices_enabled() {
            let mut vertices: Vec<(&Vertex, f64)> = self
                .models
                .iter()
                .flat_map(|m| m.mesh().vertices.iter())
                .map(|v| (v, v.distance_to(&eye)))
                .collect();
            vertices.sort_by(|a, b| b.1.total_cmp(&a.1));
            for (vertex, _) in vertices {
                painter.vertex(vertex);
            }
        }
    }

    /// Every face (and edge of face-less meshes), farthest from `eye`
    /// first. The sort is stable, so equal distances keep submission order.
    fn pool(&self, eye: &Point3<f64>) -> Vec<Pooled<'_>> {
        let mut pooled = Vec::new();
        for model in &self.models {
            let mesh = model.mesh();
            let vertices = mesh.vertices.as_slice();
            if !mesh.faces.is_empty() {
                pooled.extend(mesh.faces.iter().map(|face| Pooled {
                    primitive: Primitive::Face(face),
                    vertices,
                    distance: face.center(vertices).distance_to(eye),
                }));
            } else {
                pooled.extend(mesh.edges.iter().map(|edge| Pooled {
                    primitive: Primitive::Edge(edge, mesh.color),
                    vertices,
                    distance: edge.center(vertices).distance_to(eye),
                }));
            }
        }

        pooled.sort_by(|a, b| b.distance.total_cmp(&a.distance));
        pooled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::geometry::{FaceColoring, MeshStyle};
    use crate::obj::parse_obj;
    use crate::projection::{ScreenPoint, Viewport};
    use crate::raster::{DrawCommand, RecordingBuffer};
    use crate::scene::{Animation, Model};
    use crate::transform::Motion;

    fn projector_at(position: Point3<f64>) -> Projector {
        Projector::new(&Camera::new(position), 1000.0, Viewport::new(640, 480))
    }

    fn flat_options(policy: DepthPolicy) -> RenderOptions {
        RenderOptions {
            policy,
            vertex_size: 0,
            vertex_color: Rgb::WHITE,
            hollow_faces: false,
            illumination: None,
        }
    }

    /// A single triangle at depth `z`, colored `color`
    fn panel(z: f64, color: Rgb) -> Model {
        let raw = parse_obj(&format!("v -1 -1 {z}\nv 1 -1 {z}\nv 0 1 {z}\nf 1 2 3\n"));
        Model::new(
            color.to_string(),
            Mesh::from_raw(raw, MeshStyle::Solid, FaceColoring::Uniform, color),
            Motion::Identity,
            Animation::Static,
        )
    }

    fn triangle_colors(buffer: &RecordingBuffer) -> Vec<Rgb> {
        buffer.triangles().map(|(_, color)| color).collect()
    }

    #[test]
    fn test_per_model_order_ignores_depth() {
        // near panel submitted first, far panel drawn over it
        let scene = Scene::new(vec![panel(10.0, Rgb::RED), panel(50.0, Rgb::BLUE)]);
        let mut buffer = RecordingBuffer::new();
        scene.render(&projector_at(Point3::origin()), &flat_options(DepthPolicy::PerModel), &mut buffer);
        assert_eq!(triangle_colors(&buffer), vec![Rgb::RED, Rgb::BLUE]);
    }

    #[test]
    fn test_global_sort_draws_far_first() {
        let scene = Scene::new(vec![
            panel(10.0, Rgb::RED),
            panel(50.0, Rgb::BLUE),
            panel(30.0, Rgb::GREEN),
        ]);
        let mut buffer = RecordingBuffer::new();
        let stats = scene.render(&projector_at(Point3::origin()), &flat_options(DepthPolicy::Global), &mut buffer);
        assert_eq!(triangle_colors(&buffer), vec![Rgb::BLUE, Rgb::GREEN, Rgb::RED]);
        assert_eq!(stats.faces, 3);
    }

    #[test]
    fn test_global_sort_is_deterministic_with_ties() {
        let scene = Scene::new(vec![
            panel(20.0, Rgb::RED),
            panel(20.0, Rgb::GREEN),
            panel(20.0, Rgb::BLUE),
        ]);
        let projector = projector_at(Point3::origin());
        let options = flat_options(DepthPolicy::Global);

        let mut first = RecordingBuffer::new();
        scene.render(&projector, &options, &mut first);
        for _ in 0..5 {
            let mut again = RecordingBuffer::new();
            scene.render(&projector, &options, &mut again);
            assert_eq!(again.commands, first.commands);
        }
        assert_eq!(triangle_colors(&first), vec![Rgb::RED, Rgb::GREEN, Rgb::BLUE]);
    }

    #[test]
    fn test_partially_visible_face_is_dropped() {
        let raw = parse_obj("v 0 0 10\nv 1 0 10\nv 0 1 -10\nv 0 1 10\nf 1 2 3\nf 1 2 4\n");
        let mesh = Mesh::from_raw(raw, MeshStyle::Solid, FaceColoring::Uniform, Rgb::RED);
        let mut buffer = RecordingBuffer::new();
        let stats = mesh.render(&projector_at(Point3::origin()), &flat_options(DepthPolicy::PerModel), &mut buffer);
        assert_eq!(stats.faces, 1);
        assert_eq!(stats.culled, 1);
        assert_eq!(buffer.commands.len(), 1);
    }

    #[test]
    fn test_vertices_follow_faces() {
        let mut options = flat_options(DepthPolicy::PerModel);
        options.vertex_size = 3;
        options.hollow_faces = true;
        let scene = Scene::new(vec![panel(10.0, Rgb::RED)]);
        let mut buffer = RecordingBuffer::new();
        scene.render(&projector_at(Point3::origin()), &options, &mut buffer);

        assert!(matches!(buffer.commands[0], DrawCommand::Triangle { filled: false, .. }));
        assert_eq!(
            buffer.commands[1],
            DrawCommand::Point {
                center: ScreenPoint::new(320 - 100, 240 + 100),
                radius: 3,
                color: Rgb::WHITE
            }
        );
        assert_eq!(buffer.commands.len(), 4);
    }

    #[test]
    fn test_global_vertices_sorted_far_first() {
        let mut options = flat_options(DepthPolicy::Global);
        options.vertex_size = 1;
        let raw = parse_obj("v 0 0 10\nv 0 0 30\nv 0 0 20\n");
        let mesh = Mesh::from_raw(raw, MeshStyle::Solid, FaceColoring::Uniform, Rgb::RED);
        let scene = Scene::new(vec![Model::new("dots", mesh, Motion::Identity, Animation::Static)]);
        let mut buffer = RecordingBuffer::new();
        scene.render(&projector_at(Point3::new(5.0, 0.0, 0.0)), &options, &mut buffer);

        let xs: Vec<i32> = buffer
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Point { center, .. } => Some(center.x),
                _ => None,
            })
            .collect();
        // -5 * 1000 / z
        assert_eq!(xs, vec![320 - 167, 320 - 250, 320 - 500]);
    }

    #[test]
    fn test_wireframe_mesh_draws_edges() {
        let raw = parse_obj("v -1 0 10\nv 1 0 10\nv 0 1 10\nf 1 2 3\n");
        let mesh = Mesh::from_raw(raw, MeshStyle::Wireframe, FaceColoring::Uniform, Rgb::GREEN);
        let scene = Scene::new(vec![Model::new("wire", mesh, Motion::Identity, Animation::Static)]);
        for policy in [DepthPolicy::PerModel, DepthPolicy::Global] {
            let mut buffer = RecordingBuffer::new();
            let stats = scene.render(&projector_at(Point3::origin()), &flat_options(policy), &mut buffer);
            assert_eq!(stats.edges, 3);
            assert!(buffer
                .commands
                .iter()
                .all(|c| matches!(c, DrawCommand::Line { color: Rgb::GREEN, .. })));
        }
    }

    #[test]
    fn test_illumination_tints_by_distance() {
        let mut options = flat_options(DepthPolicy::Global);
        options.illumination = Some(100.0 * 100.0);
        let scene = Scene::new(vec![panel(100.0, Rgb::new(200, 200, 200)), panel(200.0, Rgb::new(200, 200, 200))]);
        let mut buffer = RecordingBuffer::new();
        scene.render(&projector_at(Point3::origin()), &options, &mut buffer);
        assert_eq!(
            triangle_colors(&buffer),
            vec![Rgb::new(50, 50, 50), Rgb::new(200, 200, 200)]
        );
    }

    #[test]
    fn test_illumination_with_camera_on_face_center() {
        // the bounding-box center (1, 1, 1) lies off the triangle's plane,
        // so a camera placed there can still face the whole triangle
        let raw = parse_obj("v 0 0 0\nv 2 0 2\nv 0 2 2\nf 1 2 3\n");
        let mesh = Mesh::from_raw(raw, MeshStyle::Solid, FaceColoring::Uniform, Rgb::BLUE);
        let center = mesh.faces[0].center(&mesh.vertices);
        assert_eq!(center, Point3::new(1.0, 1.0, 1.0));

        // look along (-1, -1, 1)
        let yaw = (1.0_f64 / 3.0_f64.sqrt()).asin();
        let camera = Camera::with_angles(center, yaw, -std::f64::consts::FRAC_PI_4 / yaw.cos());
        let projector = Projector::new(&camera, 1000.0, Viewport::new(640, 480));

        let mut options = flat_options(DepthPolicy::PerModel);
        options.illumination = Some(1.0);
        let mut buffer = RecordingBuffer::new();
        let stats = mesh.render(&projector, &options, &mut buffer);
        assert_eq!(stats.faces, 1);
        assert_eq!(triangle_colors(&buffer), vec![Rgb::WHITE]);
    }

    #[test]
    fn test_degenerate_face_renders_three_equal_points() {
        let raw = parse_obj("v 0.5 0.25 3\nf 1 1 1\n");
        let mesh = Mesh::from_raw(raw, MeshStyle::Solid, FaceColoring::Uniform, Rgb::RED);
        let mut buffer = RecordingBuffer::new();
        mesh.render(&projector_at(Point3::origin()), &flat_options(DepthPolicy::PerModel), &mut buffer);
        let (corners, _) = buffer.triangles().next().unwrap();
        assert_eq!(corners[0], corners[1]);
        assert_eq!(corners[1], corners[2]);
        assert_eq!(corners[0], ScreenPoint::new(320 + 166, 240 - 83));
    }
}
