//! GLSL to SPIR-V compilation for the two pipeline stages.
//!
//! Both stages are always compiled so that every diagnostic reaches the log,
//! but a failure in either one stops program construction.

use crate::config::ShaderSources;
use gfx_hal::pso;
use log::{debug, error};
use std::fmt;
use std::io::{self, Cursor, Read};
use thiserror::Error;

const SPIRV_MAGIC: u32 = 0x0723_0203;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn kind(self) -> glsl_to_spirv::ShaderType {
        match self {
            ShaderStage::Vertex => glsl_to_spirv::ShaderType::Vertex,
            ShaderStage::Fragment => glsl_to_spirv::ShaderType::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("{stage} shader produced unreadable SPIR-V: {source}")]
    Spirv {
        stage: ShaderStage,
        #[source]
        source: io::Error,
    },

    #[error("{stage} shader module was rejected: {reason}")]
    Module { stage: ShaderStage, reason: String },

    #[error("failed to link shader program: {0}")]
    Link(String),
}

/// SPIR-V words for both stages, ready to become shader modules.
#[derive(Debug, Clone)]
pub struct CompiledShaders {
    pub vertex: Vec<u32>,
    pub fragment: Vec<u32>,
}

pub fn compile_stage(stage: ShaderStage, source: &str) -> Result<Vec<u32>, ShaderError> {
    let mut file = glsl_to_spirv::compile(source, stage.kind()).map_err(|log| {
        let log = if log.trim().is_empty() {
            "compiler reported failure without diagnostics".to_owned()
        } else {
            log
        };
        ShaderError::Compile { stage, log }
    })?;

    let mut bytes = vec![];
    file.read_to_end(&mut bytes)
        .map_err(|source| ShaderError::Spirv { stage, source })?;
    let words = pso::read_spirv(Cursor::new(&bytes[..]))
        .map_err(|source| ShaderError::Spirv { stage, source })?;

    if words.first() != Some(&SPIRV_MAGIC) {
        return Err(ShaderError::Spirv {
            stage,
            source: io::Error::new(io::ErrorKind::InvalidData, "missing SPIR-V magic number"),
        });
    }

    debug!("compiled {} shader into {} words", stage, words.len());
    Ok(words)
}

pub fn compile_program(sources: &ShaderSources) -> Result<CompiledShaders, ShaderError> {
    let vertex = compile_stage(ShaderStage::Vertex, &sources.vertex);
    let fragment = compile_stage(ShaderStage::Fragment, &sources.fragment);

    for result in [&vertex, &fragment].iter() {
        if let Err(err) = result {
            error!("{}", err);
        }
    }

    Ok(CompiledShaders {
        vertex: vertex?,
        fragment: fragment?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn without_version(source: &str) -> String {
        source
            .lines()
            .filter(|line| !line.trim_start().starts_with("#version"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn shipped_sources_compile() {
        let compiled = compile_program(&ShaderSources::default()).unwrap();
        assert_eq!(compiled.vertex[0], SPIRV_MAGIC);
        assert_eq!(compiled.fragment[0], SPIRV_MAGIC);
    }

    #[test]
    fn vertex_stage_without_version_fails_with_log() {
        let mut sources = ShaderSources::default();
        sources.vertex = without_version(&sources.vertex);

        let err = compile_program(&sources).unwrap_err();
        match &err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(*stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn fragment_stage_without_version_fails_with_log() {
        let mut sources = ShaderSources::default();
        sources.fragment = without_version(&sources.fragment);

        let err = compile_program(&sources).unwrap_err();
        assert!(err.to_string().starts_with("fragment shader failed to compile"));
        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.trim().is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn syntax_error_is_reported() {
        let result = compile_stage(ShaderStage::Fragment, "#version 450\nvoid main() { oops }\n");
        assert!(matches!(result, Err(ShaderError::Compile { .. })));
    }
}
