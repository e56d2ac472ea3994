//! Window creation and the small state machine that decides when frames are
//! drawn and when the loop ends.

use crate::config::WindowConfig;
use gfx_hal::window::Extent2D;
use log::{debug, info};
use winit::{
    dpi::{LogicalSize, PhysicalSize, Size},
    error::OsError,
    event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};

pub fn build(config: &WindowConfig, event_loop: &EventLoop<()>) -> Result<Window, OsError> {
    let wb = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(Size::Physical(PhysicalSize::new(
            config.size.width,
            config.size.height,
        )))
        .with_min_inner_size(Size::Logical(LogicalSize::new(
            f64::from(config.min_size.width),
            f64::from(config.min_size.height),
        )));
    let window = wb.build(event_loop)?;
    info!(
        "created window \"{}\" at {}x{}",
        config.title, config.size.width, config.size.height
    );
    Ok(window)
}

/// The window events the loop cares about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    CloseRequested,
    KeyPressed(VirtualKeyCode),
    Resized(Extent2D),
}

impl Signal {
    pub fn from_event(event: &WindowEvent<'_>) -> Option<Signal> {
        match event {
            WindowEvent::CloseRequested => Some(Signal::CloseRequested),
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(key),
                        ..
                    },
                ..
            } => Some(Signal::KeyPressed(*key)),
            WindowEvent::Resized(size) => Some(Signal::Resized(extent(*size))),
            WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                Some(Signal::Resized(extent(**new_inner_size)))
            }
            _ => None,
        }
    }
}

fn extent(size: PhysicalSize<u32>) -> Extent2D {
    Extent2D {
        width: size.width,
        height: size.height,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Closing,
    Terminated,
}

/// Tracks the loop phase and the framebuffer size the renderer still has
/// to catch up with.
#[derive(Debug)]
pub struct FrameLoop {
    phase: Phase,
    quit_key: VirtualKeyCode,
    extent: Extent2D,
    pending_resize: Option<Extent2D>,
}

impl FrameLoop {
    pub fn new(quit_key: VirtualKeyCode, extent: Extent2D) -> Self {
        FrameLoop {
            phase: Phase::Running,
            quit_key,
            extent,
            pending_resize: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn handle(&mut self, signal: Signal) {
        match signal {
            Signal::CloseRequested => self.close(),
            Signal::KeyPressed(key) if key == self.quit_key => self.close(),
            Signal::KeyPressed(_) => {}
            Signal::Resized(extent) => {
                debug!("framebuffer resized to {}x{}", extent.width, extent.height);
                self.extent = extent;
                self.pending_resize = Some(extent);
            }
        }
    }

    pub fn close(&mut self) {
        if self.phase == Phase::Running {
            info!("close requested");
            self.phase = Phase::Closing;
        }
    }

    pub fn terminate(&mut self) {
        self.phase = Phase::Terminated;
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// The latest size the swapchain must be rebuilt for, if it changed
    /// since the last call. Zero-sized extents are held back until the
    /// window has an area again.
    pub fn take_resize(&mut self) -> Option<Extent2D> {
        if self.is_minimized() {
            return None;
        }
        self.pending_resize.take()
    }

    pub fn should_draw(&self) -> bool {
        self.is_running() && !self.is_minimized() && self.pending_resize.is_none()
    }

    fn is_minimized(&self) -> bool {
        self.extent.width == 0 || self.extent.height == 0
    }
}
