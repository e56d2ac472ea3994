use super::shader::ShaderError;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RendererError {
    #[error("no queue family supports both graphics and presentation")]
    NoGraphicsQueue,

    #[error("no CPU-visible memory type fits the vertex buffer")]
    NoUploadMemory,

    #[error("refusing to create an empty vertex buffer")]
    EmptyVertexData,

    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// A backend call failed; `what` names the call.
    #[error("{what} failed: {reason}")]
    Backend { what: &'static str, reason: String },
}

/// Wraps a gfx-hal error, whose types only promise `Debug`.
pub(crate) fn backend<E: Debug>(what: &'static str) -> impl FnOnce(E) -> RendererError {
    move |err| RendererError::Backend {
        what,
        reason: format!("{:?}", err),
    }
}
