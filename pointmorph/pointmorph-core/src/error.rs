//! Error type for the morph component.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MorphError {
    #[error("mesh list is empty")]
    NoMeshes,
    #[error("mesh {index} has no triangles and cannot be sampled")]
    EmptyMesh { index: usize },
    #[error("mesh {mesh} references vertex {index} but has only {vertex_count} vertices")]
    IndexOutOfRange { mesh: usize, index: u32, vertex_count: u32 },
    #[error("component is not running; call start() first")]
    NotStarted,
    /// GPU allocation or dispatch failure. Fatal for the component.
    #[error("backend error: {0}")]
    Backend(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type MorphResult<T> = Result<T, MorphError>;
