use std::fmt;

use crate::types::ParameterError;

/// Programmable stage a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

impl Stage {
    pub(crate) fn naga(self) -> wgpu::naga::ShaderStage {
        match self {
            Stage::Vertex => wgpu::naga::ShaderStage::Vertex,
            Stage::Fragment => wgpu::naga::ShaderStage::Fragment,
        }
    }
}

/// Reasons the lightning effect could not be brought up.
///
/// Every variant is terminal for the effect only: the window keeps running
/// with an unpainted effect region and nothing is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error("no drawable surface: {0}")]
    SurfaceUnavailable(String),
    #[error("GPU rendering context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    ShaderCompile { stage: Stage, diagnostic: String },
    #[error("shader program failed to link: {0}")]
    ProgramLink(String),
    #[error(transparent)]
    Parameters(#[from] ParameterError),
}
