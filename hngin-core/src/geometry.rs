/// Geometry primitives for 3D rendering
use nalgebra::{distance, Point3, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::obj::RawMesh;
use crate::transform::{apply, Motion};

/// A mesh point. Meshes own their vertices in one array; edges and faces
/// refer to them by index.
pub type Vertex = Point3<f64>;

/// Small conveniences on top of nalgebra points
pub trait PointExt {
    /// A copy moved by `(dx, dy, dz)`
    fn translated(&self, dx: f64, dy: f64, dz: f64) -> Self;
    fn distance_to(&self, other: &Self) -> f64;
}

impl PointExt for Point3<f64> {
    fn translated(&self, dx: f64, dy: f64, dz: f64) -> Self {
        self + Vector3::new(dx, dy, dz)
    }

    fn distance_to(&self, other: &Self) -> f64 {
        distance(self, other)
    }
}

/// Midpoint of the axis-aligned bounding box of `points`.
///
/// This is deliberately not the centroid: depth sorting keys on it.
pub fn bounding_center<'a>(points: impl IntoIterator<Item = &'a Vertex>) -> Vertex {
    let mut min = Vector3::repeat(f64::INFINITY);
    let mut max = Vector3::repeat(f64::NEG_INFINITY);
    for p in points {
        min = min.inf(&p.coords);
        max = max.sup(&p.coords);
    }
    Point3::from((max + min) / 2.0)
}

/// A line segment between two vertices of the owning mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub vertices: [usize; 2],
}

impl Edge {
    pub fn new(a: usize, b: usize) -> Self {
        Self { vertices: [a, b] }
    }

    pub fn center(&self, vertices: &[Vertex]) -> Vertex {
        bounding_center(self.vertices.iter().map(|&i| &vertices[i]))
    }
}

/// A colored triangle between three vertices of the owning mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub vertices: [usize; 3],
    pub color: Rgb,
}

impl Face {
    pub fn new(v0: usize, v1: usize, v2: usize, color: Rgb) -> Self {
        Self {
            vertices: [v0, v1, v2],
            color,
        }
    }

    pub fn positions<'a>(&self, vertices: &'a [Vertex]) -> [&'a Vertex; 3] {
        self.vertices.map(|i| &vertices[i])
    }

    pub fn center(&self, vertices: &[Vertex]) -> Vertex {
        bounding_center(self.positions(vertices))
    }
}

/// Which primitives a loaded mesh is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshStyle {
    /// Every triangle becomes three edges
    Wireframe,
    #[default]
    Solid,
}

/// How faces get their color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaceColoring {
    /// Every face takes the mesh color
    #[default]
    Uniform,
    /// Every face gets its own random tint, reproducible from `seed`
    Random { seed: u64 },
}

/// A polygonal mesh: vertex arena plus edges or faces indexing into it
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub faces: Vec<Face>,
    pub color: Rgb,
}

impl Mesh {
    pub fn new(color: Rgb) -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            color,
        }
    }

    /// Build a mesh from loader output.
    ///
    /// Loader indices are already validated, so every edge and face refers
    /// into `raw.vertices`.
    pub fn from_raw(raw: RawMesh, style: MeshStyle, coloring: FaceColoring, color: Rgb) -> Self {
        let mut mesh = Self::new(color);
        mesh.vertices = raw.vertices;

        match style {
            MeshStyle::Wireframe => {
                mesh.edges.reserve(raw.faces.len() * 3);
                for [a, b, c] in raw.faces {
                    mesh.edges.push(Edge::new(a, b));
                    mesh.edges.push(Edge::new(b, c));
                    mesh.edges.push(Edge::new(c, a));
                }
            }
            MeshStyle::Solid => {
                mesh.faces.reserve(raw.faces.len());
                for [a, b, c] in raw.faces {
                    mesh.faces.push(Face::new(a, b, c, color));
                }
                mesh.recolor(coloring);
            }
        }

        mesh
    }

    /// Reassign face colors
    pub fn recolor(&mut self, coloring: FaceColoring) {
        match coloring {
            FaceColoring::Uniform => {
                for face in &mut self.faces {
                    face.color = self.color;
                }
            }
            FaceColoring::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                for face in &mut self.faces {
                    face.color = Rgb::new(rng.gen(), rng.gen(), rng.gen());
                }
            }
        }
    }

    /// Move every vertex by `motion`. Each vertex is visited exactly once,
    /// so vertices shared between faces stay shared.
    pub fn transform(&mut self, motion: &Motion) {
        for vertex in &mut self.vertices {
            *vertex = apply(motion, vertex);
        }
    }

    /// Overwrite this mesh's vertices with `base`'s vertices moved by
    /// `motion`. Topology and colors are left as they are; `base` must have
    /// the same vertex count.
    pub fn rederive_from(&mut self, base: &Mesh, motion: &Motion) {
        debug_assert_eq!(self.vertices.len(), base.vertices.len());
        for (vertex, original) in self.vertices.iter_mut().zip(&base.vertices) {
            *vertex = apply(motion, original);
        }
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub fn add_face(&mut self, v0: usize, v1: usize, v2: usize) {
        let color = self.color;
        self.faces.push(Face::new(v0, v1, v2, color));
    }

    /// Check that every edge and face index points into `vertices`
    pub fn is_consistent(&self) -> bool {
        let n = self.vertices.len();
        self.edges.iter().all(|e| e.vertices.iter().all(|&i| i < n))
            && self.faces.iter().all(|f| f.vertices.iter().all(|&i| i < n))
    }

    /// Create a solid cube centered on the origin
    pub fn cube(size: f64, color: Rgb) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::new(color);

        for &z in &[half, -half] {
            for &(x, y) in &[(-half, -half), (half, -half), (half, half), (-half, half)] {
                mesh.add_vertex(Point3::new(x, y, z));
            }
        }

        // Front face
        mesh.add_face(0, 1, 2);
        mesh.add_face(0, 2, 3);
        // Back face
        mesh.add_face(4, 7, 6);
        mesh.add_face(4, 6, 5);
        // Top face
        mesh.add_face(7, 3, 2);
        mesh.add_face(7, 2, 6);
        // Bottom face
        mesh.add_face(4, 5, 1);
        mesh.add_face(4, 1, 0);
        // Right face
        mesh.add_face(5, 6, 2);
        mesh.add_face(5, 2, 1);
        // Left face
        mesh.add_face(4, 0, 3);
        mesh.add_face(4, 3, 7);

        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new(Rgb::WHITE)
    }
}
