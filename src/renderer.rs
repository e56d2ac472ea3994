use gfx_hal::{
    adapter::Adapter,
    command, format as f, image as i, pass,
    prelude::*,
    queue::{family::QueueFamilyId, QueueGroup, Submission},
    window, Backend, Features,
};
use log::{debug, info, warn};

use std::borrow::Borrow;
use std::iter;
use std::mem::ManuallyDrop;
use std::ptr;

mod buffer;
mod error;
mod frame;
mod memory;
mod pipeline;
pub mod shader;
mod swapchain;
mod vertex;

use crate::config::AppConfig;
use crate::mesh::MeshTable;
use buffer::Buffer;
use error::backend;
use frame::FrameSlot;
use memory::Memory;
use pipeline::Pipeline;
use shader::CompiledShaders;
use swapchain::Swapchain;

pub use error::RendererError;
pub use vertex::Vertex;

/// Owns the device and every object created on it. Built once, driven one
/// frame at a time from the event loop, and torn down when dropped.
pub struct Renderer<B: Backend> {
    instance: B::Instance,
    surface: ManuallyDrop<B::Surface>,
    adapter: Adapter<B>,
    device: B::Device,
    queue_group: QueueGroup<B>,
    frame: usize,
    vertex_count: u32,
    clear_color: [f32; 4],
    frames: Vec<FrameSlot<B>>,
    memory: ManuallyDrop<Memory<B>>,
    swapchain: Swapchain,
    render_pass: ManuallyDrop<B::RenderPass>,
    pipeline: ManuallyDrop<Pipeline<B>>,
}

/// Device-level objects, built before anything is attached to the surface.
struct Gpu<B: Backend> {
    device: B::Device,
    queue_group: QueueGroup<B>,
    memory: Memory<B>,
}

/// Objects that depend on the configured swapchain.
struct Presentation<B: Backend> {
    swapchain: Swapchain,
    render_pass: B::RenderPass,
    pipeline: Pipeline<B>,
    frames: Vec<FrameSlot<B>>,
}

impl<B> Renderer<B>
where
    B: Backend,
{
    /// Takes ownership of the surface. If any step fails, everything built
    /// so far is released, the surface included.
    pub fn new(
        instance: B::Instance,
        mut surface: B::Surface,
        adapter: Adapter<B>,
        config: &AppConfig,
        mesh: &MeshTable,
        shaders: &CompiledShaders,
    ) -> Result<Self, RendererError> {
        let (gpu, presentation) = match Self::open(&mut surface, &adapter, config, mesh, shaders) {
            Ok(parts) => parts,
            Err(err) => {
                unsafe { instance.destroy_surface(surface) };
                return Err(err);
            }
        };

        info!(
            "renderer ready: {} triangles, {}x{} framebuffer",
            mesh.triangle_count(),
            presentation.swapchain.extent.width,
            presentation.swapchain.extent.height
        );

        Ok(Renderer {
            instance,
            surface: ManuallyDrop::new(surface),
            adapter,
            device: gpu.device,
            queue_group: gpu.queue_group,
            frame: 0,
            vertex_count: mesh.vertex_count(),
            clear_color: config.clear_color,
            frames: presentation.frames,
            memory: ManuallyDrop::new(gpu.memory),
            swapchain: presentation.swapchain,
            render_pass: ManuallyDrop::new(presentation.render_pass),
            pipeline: ManuallyDrop::new(presentation.pipeline),
        })
    }

    fn open(
        surface: &mut B::Surface,
        adapter: &Adapter<B>,
        config: &AppConfig,
        mesh: &MeshTable,
        shaders: &CompiledShaders,
    ) -> Result<(Gpu<B>, Presentation<B>), RendererError> {
        let family = adapter
            .queue_families
            .iter()
            .find(|family| {
                surface.supports_queue_family(family) && family.queue_type().supports_graphics()
            })
            .ok_or(RendererError::NoGraphicsQueue)?;
        let mut gpu = unsafe {
            adapter
                .physical_device
                .open(&[(family, &[1.0])], Features::empty())
        }
        .map_err(backend("open logical device"))?;
        let queue_group = gpu.queue_groups.pop().ok_or(RendererError::NoGraphicsQueue)?;
        let device = gpu.device;

        let memory_types = adapter.physical_device.memory_properties().memory_types;
        let limits = adapter.physical_device.limits();

        let vertex_buffer = Buffer::<B>::new(&device, mesh.vertices(), &limits)?;
        let memory = Memory::new(&device, vertex_buffer, mesh.vertices(), &memory_types)?;
        debug!("uploaded {} bytes of vertex data", memory.buffer.len);

        match Self::present(&device, surface, adapter, config, shaders, queue_group.family) {
            Ok(presentation) => Ok((
                Gpu {
                    device,
                    queue_group,
                    memory,
                },
                presentation,
            )),
            Err(err) => {
                unsafe { memory.destroy(&device) };
                Err(err)
            }
        }
    }

    fn present(
        device: &B::Device,
        surface: &mut B::Surface,
        adapter: &Adapter<B>,
        config: &AppConfig,
        shaders: &CompiledShaders,
        family: QueueFamilyId,
    ) -> Result<Presentation<B>, RendererError> {
        let swapchain = Swapchain::new(device, surface, adapter, config.window.size)?;

        let render_pass = match Self::create_render_pass(device, swapchain.format) {
            Ok(render_pass) => render_pass,
            Err(err) => {
                unsafe { surface.unconfigure_swapchain(device) };
                return Err(err);
            }
        };

        let pipeline = match Pipeline::<B>::new(device, shaders, &render_pass) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                unsafe {
                    device.destroy_render_pass(render_pass);
                    surface.unconfigure_swapchain(device);
                }
                return Err(err.into());
            }
        };

        let frames = match FrameSlot::create_all(device, family, config.frames_in_flight) {
            Ok(frames) => frames,
            Err(err) => {
                unsafe {
                    pipeline.destroy(device);
                    device.destroy_render_pass(render_pass);
                    surface.unconfigure_swapchain(device);
                }
                return Err(err);
            }
        };

        Ok(Presentation {
            swapchain,
            render_pass,
            pipeline,
            frames,
        })
    }

    pub fn frame_index(&self) -> usize {
        self.frame
    }

    pub fn extent(&self) -> window::Extent2D {
        self.swapchain.extent
    }

    /// Reconfigures the swapchain for a new framebuffer size. The viewport
    /// follows, so the next frame covers exactly the new extent.
    pub fn resize(&mut self, dims: window::Extent2D) -> Result<(), RendererError> {
        self.device
            .wait_idle()
            .map_err(backend("wait for device idle"))?;
        self.swapchain
            .recreate(&self.device, &mut *self.surface, &self.adapter, dims)
    }

    pub fn render(&mut self) -> Result<(), RendererError> {
        let surface_image = match unsafe { self.surface.acquire_image(!0) } {
            Ok((image, _)) => image,
            Err(err) => {
                debug!("acquire failed ({:?}), reconfiguring", err);
                let dims = self.swapchain.extent;
                return self
                    .swapchain
                    .recreate(&self.device, &mut *self.surface, &self.adapter, dims);
            }
        };

        let slot_index = frame::slot_for(self.frame, self.frames.len());
        let slot = &mut self.frames[slot_index];
        slot.wait_and_reset(&self.device)?;

        let frame_buffer = unsafe {
            let view: &B::ImageView = surface_image.borrow();
            self.device.create_framebuffer(
                &self.render_pass,
                iter::once(view),
                self.swapchain.extent.to_extent(),
            )
        }
        .map_err(backend("create framebuffer"))?;

        let viewport = self.swapchain.viewport.clone();
        let cmd_buffer = &mut slot.command_buffer;
        let presented = unsafe {
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);
            cmd_buffer.set_viewports(0, &[viewport.clone()]);
            cmd_buffer.set_scissors(0, &[viewport.rect]);
            cmd_buffer.bind_graphics_pipeline(&self.pipeline.pipeline);
            cmd_buffer.bind_vertex_buffers(
                0,
                iter::once((&self.memory.buffer.buf, gfx_hal::buffer::SubRange::WHOLE)),
            );
            cmd_buffer.begin_render_pass(
                &self.render_pass,
                &frame_buffer,
                viewport.rect,
                &[command::ClearValue {
                    color: command::ClearColor {
                        float32: self.clear_color,
                    },
                }],
                command::SubpassContents::Inline,
            );
            cmd_buffer.draw(0..self.vertex_count, 0..1);
            cmd_buffer.end_render_pass();
            cmd_buffer.finish();

            let submission = Submission {
                command_buffers: iter::once(&*cmd_buffer),
                wait_semaphores: None,
                signal_semaphores: iter::once(&slot.submission_complete_semaphore),
            };

            let queue = &mut self.queue_group.queues[0];
            queue.submit(submission, Some(&slot.submission_complete_fence));

            let result = queue.present_surface(
                &mut *self.surface,
                surface_image,
                Some(&slot.submission_complete_semaphore),
            );

            self.device.destroy_framebuffer(frame_buffer);
            result
        };

        self.frame += 1;

        if let Err(err) = presented {
            debug!("present failed ({:?}), reconfiguring", err);
            let dims = self.swapchain.extent;
            self.swapchain
                .recreate(&self.device, &mut *self.surface, &self.adapter, dims)?;
        }
        Ok(())
    }

    fn create_render_pass(
        device: &B::Device,
        format: f::Format,
    ) -> Result<B::RenderPass, RendererError> {
        let attachment = pass::Attachment {
            format: Some(format),
            samples: 1,
            ops: pass::AttachmentOps::new(
                pass::AttachmentLoadOp::Clear,
                pass::AttachmentStoreOp::Store,
            ),
            stencil_ops: pass::AttachmentOps::DONT_CARE,
            layouts: i::Layout::Undefined..i::Layout::Present,
        };

        let subpass = pass::SubpassDesc {
            colors: &[(0, i::Layout::ColorAttachmentOptimal)],
            depth_stencil: None,
            inputs: &[],
            resolves: &[],
            preserves: &[],
        };

        unsafe { device.create_render_pass(&[attachment], &[subpass], &[]) }
            .map_err(backend("create render pass"))
    }
}

impl<B: Backend> Drop for Renderer<B> {
    fn drop(&mut self) {
        let device = &self.device;
        if let Err(err) = device.wait_idle() {
            warn!("device did not go idle before teardown: {:?}", err);
        }
        unsafe {
            ManuallyDrop::into_inner(ptr::read(&self.memory)).destroy(device);
            ManuallyDrop::into_inner(ptr::read(&self.pipeline)).destroy(device);
            device.destroy_render_pass(ManuallyDrop::into_inner(ptr::read(&self.render_pass)));

            for slot in self.frames.drain(..) {
                slot.destroy(device);
            }

            self.surface.unconfigure_swapchain(device);
            self.instance
                .destroy_surface(ManuallyDrop::into_inner(ptr::read(&self.surface)));
        }
        info!("released vertex buffer, pipeline and surface");
    }
}
