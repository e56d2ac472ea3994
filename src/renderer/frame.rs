use super::error::{backend, RendererError};
use gfx_hal::{command, pool, prelude::*, queue::family::QueueFamilyId, Backend};

/// Everything one frame in flight records into and waits on. Each slot has
/// its own command pool, so resetting it never touches a command buffer
/// another slot may still have pending on the GPU.
pub struct FrameSlot<B: Backend> {
    pub command_pool: B::CommandPool,
    pub command_buffer: B::CommandBuffer,
    pub submission_complete_semaphore: B::Semaphore,
    pub submission_complete_fence: B::Fence,
}

impl<B: Backend> FrameSlot<B> {
    pub fn new(device: &B::Device, family: QueueFamilyId) -> Result<Self, RendererError> {
        let mut command_pool =
            unsafe { device.create_command_pool(family, pool::CommandPoolCreateFlags::empty()) }
                .map_err(backend("create command pool"))?;
        let command_buffer = unsafe { command_pool.allocate_one(command::Level::Primary) };

        let submission_complete_semaphore = match device.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(err) => {
                unsafe { device.destroy_command_pool(command_pool) };
                return Err(backend("create semaphore")(err));
            }
        };
        let submission_complete_fence = match device.create_fence(true) {
            Ok(fence) => fence,
            Err(err) => {
                unsafe {
                    device.destroy_semaphore(submission_complete_semaphore);
                    device.destroy_command_pool(command_pool);
                }
                return Err(backend("create fence")(err));
            }
        };

        Ok(FrameSlot {
            command_pool,
            command_buffer,
            submission_complete_semaphore,
            submission_complete_fence,
        })
    }

    /// Creates `count` slots, releasing the ones already made if a later
    /// one fails.
    pub fn create_all(
        device: &B::Device,
        family: QueueFamilyId,
        count: usize,
    ) -> Result<Vec<Self>, RendererError> {
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            match Self::new(device, family) {
                Ok(slot) => slots.push(slot),
                Err(err) => {
                    for slot in slots {
                        unsafe { slot.destroy(device) };
                    }
                    return Err(err);
                }
            }
        }
        Ok(slots)
    }

    /// Waits until the GPU is done with this slot's previous submission,
    /// then rearms the fence and recycles the command pool.
    pub fn wait_and_reset(&mut self, device: &B::Device) -> Result<(), RendererError> {
        unsafe {
            device
                .wait_for_fence(&self.submission_complete_fence, !0)
                .map_err(backend("wait for fence"))?;
            device
                .reset_fence(&self.submission_complete_fence)
                .map_err(backend("reset fence"))?;
            self.command_pool.reset(false);
        }
        Ok(())
    }

    pub unsafe fn destroy(self, device: &B::Device) {
        device.destroy_semaphore(self.submission_complete_semaphore);
        device.destroy_fence(self.submission_complete_fence);
        device.destroy_command_pool(self.command_pool);
    }
}

/// Which slot frame number `frame` records into.
pub fn slot_for(frame: usize, frames_in_flight: usize) -> usize {
    frame % frames_in_flight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_frames_never_share_a_slot() {
        for frames_in_flight in 2..=4 {
            for frame in 0..32 {
                let current = slot_for(frame, frames_in_flight);
                for earlier in frame.saturating_sub(frames_in_flight - 1)..frame {
                    assert_ne!(slot_for(earlier, frames_in_flight), current);
                }
            }
        }
    }

    #[test]
    fn slot_comes_back_after_every_frame_in_flight() {
        for frames_in_flight in 1..=3 {
            for frame in 0..16 {
                assert_eq!(
                    slot_for(frame, frames_in_flight),
                    slot_for(frame + frames_in_flight, frames_in_flight)
                );
                assert!(slot_for(frame, frames_in_flight) < frames_in_flight);
            }
        }
    }
}
