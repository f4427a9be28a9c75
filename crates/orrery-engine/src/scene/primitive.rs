use crate::math::Vec3;
use crate::render::{Topology, Vertex};

/// Immediate-mode geometry in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub topology: Topology,
    pub vertices: Vec<Vertex>,
    /// Drawn with lighting enabled; vertex normals are used only then.
    pub lit: bool,
}

impl Primitive {
    #[inline]
    pub fn new(topology: Topology, vertices: Vec<Vertex>) -> Self {
        Self { topology, vertices, lit: false }
    }

    #[inline]
    pub fn with_lighting(mut self, lit: bool) -> Self {
        self.lit = lit;
        self
    }

    /// Axis-aligned cube as 12 lit triangles.
    pub fn cube(centre: Vec3, half_size: f64, color: [f32; 4]) -> Self {
        // (normal, two in-face axes) per face
        const FACES: [([f64; 3], [f64; 3], [f64; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ];
        let mut vertices = Vec::with_capacity(36);
        for (n, u, v) in FACES {
            let (n, u, v) = (Vec3::from_array(n), Vec3::from_array(u), Vec3::from_array(v));
            let corner = |su: f64, sv: f64| {
                let p = centre + (n + u * su + v * sv) * half_size;
                Vertex::new(p.to_f32(), n.to_f32(), color)
            };
            let (a, b, c, d) = (corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0));
            vertices.extend_from_slice(&[a, b, c, a, c, d]);
        }
        Self::new(Topology::Triangles, vertices).with_lighting(true)
    }

    /// X, Y and Z axes from the origin in red, green and blue.
    pub fn axes(length: f64) -> Self {
        let l = length as f32;
        let line = |to: [f32; 3], color: [f32; 4]| {
            [
                Vertex::new([0.0; 3], [0.0, 0.0, 1.0], color),
                Vertex::new(to, [0.0, 0.0, 1.0], color),
            ]
        };
        let mut vertices = Vec::with_capacity(6);
        vertices.extend(line([l, 0.0, 0.0], [1.0, 0.0, 0.0, 1.0]));
        vertices.extend(line([0.0, l, 0.0], [0.0, 1.0, 0.0, 1.0]));
        vertices.extend(line([0.0, 0.0, l], [0.0, 0.0, 1.0, 1.0]));
        Self::new(Topology::Lines, vertices)
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .iter()
            .map(|v| Vec3::new(v.position[0] as f64, v.position[1] as f64, v.position[2] as f64))
    }

    /// True if any vertex is partially transparent.
    pub fn is_translucent(&self) -> bool {
        self.vertices.iter().any(|v| v.color[3] < 1.0)
    }
}
