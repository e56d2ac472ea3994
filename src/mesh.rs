//! The static triangle table drawn every frame.
//!
//! The table lives in `data/mosaic.ron` as a flat list of vertex records.
//! Every three consecutive records make one triangle; nothing is indexed, so
//! corners shared between neighbours are simply repeated.

use crate::renderer::Vertex;
use serde::Deserialize;
use std::convert::TryFrom;
use thiserror::Error;

const MOSAIC: &str = include_str!("data/mosaic.ron");

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("failed to parse mesh table: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("mesh table holds no vertices")]
    Empty,

    #[error("mesh table holds {0} vertices, which is not a whole number of triangles")]
    PartialTriangle(usize),

    #[error("vertex {index} has colour component {value} outside [0, 1]")]
    ColorOutOfRange { index: usize, value: f32 },

    #[error("vertex {index} has a non-finite position")]
    NonFinitePosition { index: usize },

    #[error("mesh table holds {0} vertices, more than a single draw can cover")]
    TooLarge(usize),
}

#[derive(Deserialize)]
struct MeshFile {
    vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshTable {
    vertices: Vec<Vertex>,
}

impl MeshTable {
    /// The mosaic shipped with the binary.
    pub fn mosaic() -> Result<Self, MeshError> {
        Self::from_ron(MOSAIC)
    }

    pub fn from_ron(text: &str) -> Result<Self, MeshError> {
        let file: MeshFile = ron::from_str(text)?;
        Self::new(file.vertices)
    }

    pub fn new(vertices: Vec<Vertex>) -> Result<Self, MeshError> {
        if vertices.is_empty() {
            return Err(MeshError::Empty);
        }
        if vertices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(vertices.len()));
        }
        if u32::try_from(vertices.len()).is_err() {
            return Err(MeshError::TooLarge(vertices.len()));
        }

        for (index, vertex) in vertices.iter().enumerate() {
            if vertex.position.iter().any(|c| !c.is_finite()) {
                return Err(MeshError::NonFinitePosition { index });
            }
            if let Some(&value) = vertex.color.iter().find(|c| !(0.0..=1.0).contains(*c)) {
                return Err(MeshError::ColorOutOfRange { index, value });
            }
        }

        Ok(MeshTable { vertices })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Number of vertices covered by the draw call.
    pub fn vertex_count(&self) -> u32 {
        // bounded in `new`
        self.vertices.len() as u32
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = &[Vertex]> {
        self.vertices.chunks_exact(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, color: [f32; 3]) -> Vertex {
        Vertex {
            position: [x, y, 0.0],
            color,
        }
    }

    #[test]
    fn mosaic_is_whole_triangles() {
        let mesh = MeshTable::mosaic().unwrap();
        assert_eq!(mesh.vertex_count() % 3, 0);
        assert_eq!(mesh.triangle_count(), 49);
        assert_eq!(mesh.vertex_count(), 147);
    }

    #[test]
    fn mosaic_triangles_are_flat_coloured() {
        let mesh = MeshTable::mosaic().unwrap();
        for triangle in mesh.triangles() {
            assert_eq!(triangle[0].color, triangle[1].color);
            assert_eq!(triangle[1].color, triangle[2].color);
        }
    }

    #[test]
    fn mosaic_stays_inside_clip_space() {
        let mesh = MeshTable::mosaic().unwrap();
        for v in mesh.vertices() {
            assert!(v.position[0].abs() <= 1.0 && v.position[1].abs() <= 1.0);
            assert_eq!(v.position[2], 0.0);
        }
    }

    #[test]
    fn mosaic_starts_with_the_authored_triangle() {
        let mesh = MeshTable::mosaic().unwrap();
        let first = &mesh.vertices()[0];
        let expected: [f32; 6] = [-0.04, 0.28, 0.0, 0.19, 0.91, 0.91];
        let actual = first.position.iter().chain(first.color.iter());
        for (a, e) in actual.zip(expected.iter()) {
            assert!((a - e).abs() < 1e-6);
        }
    }

    #[test]
    fn loads_a_small_synthetic_table() {
        let text = r#"(
            vertices: [
                (position: (0.0, 0.5, 0.0), color: (1.0, 0.0, 0.0)),
                (position: (-0.5, -0.5, 0.0), color: (0.0, 1.0, 0.0)),
                (position: (0.5, -0.5, 0.0), color: (0.0, 0.0, 1.0)),
            ],
        )"#;
        let mesh = MeshTable::from_ron(text).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices()[2].color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn rejects_partial_triangle() {
        let red = [1.0, 0.0, 0.0];
        let vertices = vec![
            vertex(0.0, 0.0, red),
            vertex(1.0, 0.0, red),
            vertex(0.0, 1.0, red),
            vertex(1.0, 1.0, red),
        ];
        assert!(matches!(
            MeshTable::new(vertices),
            Err(MeshError::PartialTriangle(4))
        ));
    }

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(
            MeshTable::from_ron("(vertices: [])"),
            Err(MeshError::Empty)
        ));
    }

    #[test]
    fn rejects_colour_out_of_range() {
        let ok = [0.5, 0.5, 0.5];
        let vertices = vec![
            vertex(0.0, 0.0, ok),
            vertex(1.0, 0.0, [0.2, 1.5, 0.0]),
            vertex(0.0, 1.0, ok),
        ];
        match MeshTable::new(vertices) {
            Err(MeshError::ColorOutOfRange { index, value }) => {
                assert_eq!(index, 1);
                assert_eq!(value, 1.5);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_non_finite_position() {
        let ok = [0.5, 0.5, 0.5];
        let vertices = vec![
            vertex(0.0, 0.0, ok),
            vertex(1.0, 0.0, ok),
            vertex(std::f32::NAN, 1.0, ok),
        ];
        assert!(matches!(
            MeshTable::new(vertices),
            Err(MeshError::NonFinitePosition { index: 2 })
        ));
    }

    #[test]
    fn reports_malformed_text() {
        let err = MeshTable::from_ron("(vertices: [(position: (0.0, 0.0))])").unwrap_err();
        assert!(matches!(err, MeshError::Parse(_)));
        assert!(!err.to_string().is_empty());
    }
}
