use crate::config::ConfigError;
use crate::mesh::MeshError;
use crate::renderer::shader::ShaderError;
use crate::renderer::RendererError;
use thiserror::Error;

/// Anything that stops the program before or during the render loop.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to initialize graphics backend: {0}")]
    Backend(String),

    #[error("no graphics adapter available")]
    NoAdapter,

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Renderer(#[from] RendererError),
}
