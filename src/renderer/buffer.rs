use super::error::{backend, RendererError};
use gfx_hal::{buffer, prelude::*, Backend, Limits};
use std::mem;

pub struct Buffer<B: Backend> {
    pub buf: B::Buffer,
    /// Bytes of actual content; the allocation may be larger.
    pub len: u64,
}

impl<B: Backend> Buffer<B> {
    pub fn new<T>(device: &B::Device, content: &[T], limits: &Limits) -> Result<Self, RendererError> {
        let buffer_stride = mem::size_of::<T>() as u64;
        let buffer_len = content.len() as u64 * buffer_stride;
        if buffer_len == 0 {
            return Err(RendererError::EmptyVertexData);
        }
        let memory_size = aligned_size(buffer_len, limits.non_coherent_atom_size as u64);

        let buf = unsafe { device.create_buffer(memory_size, buffer::Usage::VERTEX) }
            .map_err(backend("create vertex buffer"))?;

        Ok(Buffer {
            buf,
            len: buffer_len,
        })
    }

    pub unsafe fn destroy(self, device: &B::Device) {
        device.destroy_buffer(self.buf);
    }
}

/// Rounds `len` up to the next multiple of `alignment`.
pub(super) fn aligned_size(len: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    ((len + alignment - 1) / alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::aligned_size;

    #[test]
    fn rounds_up_to_atom_size() {
        assert_eq!(aligned_size(147 * 24, 256), 3584);
        assert_eq!(aligned_size(256, 256), 256);
        assert_eq!(aligned_size(1, 64), 64);
    }

    #[test]
    fn zero_alignment_leaves_length_alone() {
        assert_eq!(aligned_size(3528, 0), 3528);
        assert_eq!(aligned_size(3528, 1), 3528);
    }
}
