use gfx_hal::{adapter::MemoryType, memory as m, prelude::*, Backend, MemoryTypeId};
use std::iter;
use std::ptr;

use super::buffer::Buffer;
use super::error::{backend, RendererError};

/// A vertex buffer together with the memory it was uploaded into. The
/// content is written once at creation and never touched again.
pub struct Memory<B: Backend> {
    pub buffer: Buffer<B>,
    memory: B::Memory,
}

impl<B: Backend> Memory<B> {
    pub fn new<T>(
        device: &B::Device,
        mut buffer: Buffer<B>,
        content: &[T],
        memory_types: &[MemoryType],
    ) -> Result<Self, RendererError> {
        match Self::allocate_gpu_memory(device, &mut buffer, content, memory_types) {
            Ok(memory) => Ok(Memory { buffer, memory }),
            Err(err) => {
                unsafe { buffer.destroy(device) };
                Err(err)
            }
        }
    }

    fn allocate_gpu_memory<T>(
        device: &B::Device,
        buffer: &mut Buffer<B>,
        content: &[T],
        memory_types: &[MemoryType],
    ) -> Result<B::Memory, RendererError> {
        unsafe {
            let buffer_req = device.get_buffer_requirements(&buffer.buf);
            let upload_type =
                Self::upload_type(memory_types, &buffer_req).ok_or(RendererError::NoUploadMemory)?;
            let memory = device
                .allocate_memory(upload_type, buffer_req.size)
                .map_err(backend("allocate vertex memory"))?;

            if let Err(err) = Self::upload(device, &memory, buffer, content) {
                device.free_memory(memory);
                return Err(err);
            }
            Ok(memory)
        }
    }

    unsafe fn upload<T>(
        device: &B::Device,
        memory: &B::Memory,
        buffer: &mut Buffer<B>,
        content: &[T],
    ) -> Result<(), RendererError> {
        device
            .bind_buffer_memory(memory, 0, &mut buffer.buf)
            .map_err(backend("bind vertex memory"))?;
        let mapping = device
            .map_memory(memory, m::Segment::ALL)
            .map_err(backend("map vertex memory"))?;
        ptr::copy_nonoverlapping(content.as_ptr() as *const u8, mapping, buffer.len as usize);
        let flushed = device
            .flush_mapped_memory_ranges(iter::once((memory, m::Segment::ALL)))
            .map_err(backend("flush vertex memory"));
        device.unmap_memory(memory);
        flushed
    }

    fn upload_type(properties: &[MemoryType], buffer_req: &m::Requirements) -> Option<MemoryTypeId> {
        properties
            .iter()
            .enumerate()
            .position(|(id, mem_type)| {
                buffer_req.type_mask & (1 << id) != 0
                    && mem_type.properties.contains(m::Properties::CPU_VISIBLE)
            })
            .map(MemoryTypeId::from)
    }

    pub unsafe fn destroy(self, device: &B::Device) {
        self.buffer.destroy(device);
        device.free_memory(self.memory);
    }
}
