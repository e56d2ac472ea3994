use super::error::{backend, RendererError};
use gfx_hal::{adapter::Adapter, format as f, prelude::*, pso, window, Backend};
use log::debug;
use std::convert::TryFrom;

/// Presentation state of the surface: the chosen format, the current
/// framebuffer extent, and the viewport that covers it.
pub struct Swapchain {
    pub format: f::Format,
    pub extent: window::Extent2D,
    pub viewport: pso::Viewport,
}

impl Swapchain {
    pub fn new<B: Backend>(
        device: &B::Device,
        surface: &mut B::Surface,
        adapter: &Adapter<B>,
        dims: window::Extent2D,
    ) -> Result<Self, RendererError> {
        let formats = surface.supported_formats(&adapter.physical_device);
        let format = pick_format(formats.as_deref());

        let mut swapchain = Swapchain {
            format,
            extent: dims,
            viewport: viewport_for(dims),
        };

        swapchain.recreate(device, surface, adapter, dims)?;
        Ok(swapchain)
    }

    /// Reconfigures the surface for `dims` and points the viewport at the
    /// extent the surface actually accepted.
    pub fn recreate<B: Backend>(
        &mut self,
        device: &B::Device,
        surface: &mut B::Surface,
        adapter: &Adapter<B>,
        dims: window::Extent2D,
    ) -> Result<(), RendererError> {
        let caps = surface.capabilities(&adapter.physical_device);
        let mut swap_config = window::SwapchainConfig::from_caps(&caps, self.format, dims);
        swap_config.present_mode = window::PresentMode::FIFO;
        let extent = swap_config.extent;

        unsafe { surface.configure_swapchain(device, swap_config) }
            .map_err(backend("configure swapchain"))?;

        debug!("swapchain configured at {}x{}", extent.width, extent.height);
        self.extent = extent;
        self.viewport = viewport_for(extent);
        Ok(())
    }
}

/// Prefers an sRGB format, then whatever the surface lists first. A surface
/// with no preference, or an empty list, gets `Rgba8Srgb`.
pub fn pick_format(formats: Option<&[f::Format]>) -> f::Format {
    let formats = formats.unwrap_or(&[]);
    formats
        .iter()
        .find(|format| format.base_format().1 == f::ChannelType::Srgb)
        .or_else(|| formats.first())
        .copied()
        .unwrap_or(f::Format::Rgba8Srgb)
}

/// Viewport and scissor covering the whole framebuffer.
pub fn viewport_for(extent: window::Extent2D) -> pso::Viewport {
    let clamp = |v: u32| i16::try_from(v).unwrap_or(i16::max_value());
    pso::Viewport {
        rect: pso::Rect {
            x: 0,
            y: 0,
            w: clamp(extent.width),
            h: clamp(extent.height),
        },
        depth: 0.0..1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(width: u32, height: u32) -> window::Extent2D {
        window::Extent2D { width, height }
    }

    #[test]
    fn viewport_matches_framebuffer() {
        for &(w, h) in &[(985, 985), (64, 64), (1920, 1080), (640, 4000), (1, 1)] {
            let viewport = viewport_for(extent(w, h));
            assert_eq!((viewport.rect.x, viewport.rect.y), (0, 0));
            assert_eq!(viewport.rect.w as u32, w);
            assert_eq!(viewport.rect.h as u32, h);
            assert_eq!(viewport.depth, 0.0..1.0);
        }
    }

    #[test]
    fn oversized_extent_saturates() {
        let viewport = viewport_for(extent(70_000, 100));
        assert_eq!(viewport.rect.w, i16::max_value());
        assert_eq!(viewport.rect.h, 100);
    }

    #[test]
    fn format_falls_back_when_surface_lists_nothing() {
        assert_eq!(pick_format(None), f::Format::Rgba8Srgb);
        assert_eq!(pick_format(Some(&[])), f::Format::Rgba8Srgb);
    }

    #[test]
    fn format_prefers_srgb_then_first_listed() {
        let listed = [f::Format::Bgra8Unorm, f::Format::Bgra8Srgb];
        assert_eq!(pick_format(Some(&listed)), f::Format::Bgra8Srgb);

        let linear = [f::Format::Bgra8Unorm, f::Format::Rgba8Unorm];
        assert_eq!(pick_format(Some(&linear)), f::Format::Bgra8Unorm);
    }
}
