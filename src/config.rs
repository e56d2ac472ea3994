use gfx_hal::window::Extent2D;
use thiserror::Error;
use winit::event::VirtualKeyCode;

const VERTEX_SHADER: &str = include_str!("data/mosaic.vert");
const FRAGMENT_SHADER: &str = include_str!("data/mosaic.frag");

/// Everything the program needs to know up front. Built once in `main` and
/// handed down by reference; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub clear_color: [f32; 4],
    pub shaders: ShaderSources,
    pub frames_in_flight: usize,
    pub log_filter: &'static str,
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub size: Extent2D,
    pub min_size: Extent2D,
    /// Version handed to the backend instance.
    pub api_version: u32,
    pub quit_key: VirtualKeyCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window size {0}x{1} has a zero dimension")]
    EmptyWindow(u32, u32),

    #[error("minimum size {min_w}x{min_h} exceeds window size {w}x{h}")]
    MinExceedsSize { min_w: u32, min_h: u32, w: u32, h: u32 },

    #[error("at least one frame must be in flight")]
    NoFramesInFlight,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            window: WindowConfig::default(),
            clear_color: [0.0, 0.0, 0.0, 0.0],
            shaders: ShaderSources::default(),
            frames_in_flight: 2,
            log_filter: "info",
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "mosaic".to_owned(),
            size: Extent2D {
                width: 985,
                height: 985,
            },
            min_size: Extent2D {
                width: 64,
                height: 64,
            },
            api_version: 1,
            quit_key: VirtualKeyCode::Escape,
        }
    }
}

impl Default for ShaderSources {
    fn default() -> Self {
        ShaderSources {
            vertex: VERTEX_SHADER.to_owned(),
            fragment: FRAGMENT_SHADER.to_owned(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Extent2D { width, height } = self.window.size;
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyWindow(width, height));
        }

        let min = self.window.min_size;
        if min.width > width || min.height > height {
            return Err(ConfigError::MinExceedsSize {
                min_w: min.width,
                min_h: min.height,
                w: width,
                h: height,
            });
        }

        if self.frames_in_flight == 0 {
            return Err(ConfigError::NoFramesInFlight);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_mosaic_window() {
        let config = AppConfig::default();
        assert_eq!(config.window.size.width, 985);
        assert_eq!(config.window.size.height, 985);
        assert_eq!(config.window.quit_key, VirtualKeyCode::Escape);
        assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 0.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn embedded_shaders_declare_a_version() {
        let sources = ShaderSources::default();
        assert!(sources.vertex.starts_with("#version"));
        assert!(sources.fragment.starts_with("#version"));
    }

    #[test]
    fn rejects_zero_sized_window() {
        let mut config = AppConfig::default();
        config.window.size.height = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptyWindow(985, 0)));
    }

    #[test]
    fn rejects_min_size_larger_than_window() {
        let mut config = AppConfig::default();
        config.window.min_size = Extent2D {
            width: 1000,
            height: 10,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MinExceedsSize { min_w: 1000, .. })
        ));
    }

    #[test]
    fn rejects_zero_frames_in_flight() {
        let config = AppConfig {
            frames_in_flight: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoFramesInFlight));
    }
}
