use gfx_hal::{format as f, pso};
use serde::Deserialize;
use std::mem;

/// One interleaved record as the vertex shader reads it: three position
/// floats followed by three colour floats.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

const COMPONENT: u32 = mem::size_of::<[f32; 3]>() as u32;

impl Vertex {
    pub const STRIDE: u32 = mem::size_of::<Vertex>() as u32;

    pub fn buffer_desc() -> pso::VertexBufferDesc {
        pso::VertexBufferDesc {
            binding: 0,
            stride: Self::STRIDE,
            rate: pso::VertexInputRate::Vertex,
        }
    }

    pub fn attributes() -> [pso::AttributeDesc; 2] {
        [
            pso::AttributeDesc {
                location: 0,
                binding: 0,
                element: pso::Element {
                    format: f::Format::Rgb32Sfloat,
                    offset: 0,
                },
            },
            pso::AttributeDesc {
                location: 1,
                binding: 0,
                element: pso::Element {
                    format: f::Format::Rgb32Sfloat,
                    offset: COMPONENT,
                },
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_six_floats() {
        assert_eq!(Vertex::STRIDE as usize, 6 * mem::size_of::<f32>());
        assert_eq!(Vertex::buffer_desc().stride, 24);
    }

    #[test]
    fn color_follows_position() {
        let [position, color] = Vertex::attributes();
        assert_eq!((position.location, position.element.offset), (0, 0));
        assert_eq!((color.location, color.element.offset), (1, 12));
        assert_eq!(position.element.format, f::Format::Rgb32Sfloat);
        assert_eq!(color.element.format, f::Format::Rgb32Sfloat);
    }
}
