use thiserror::Error;

/// Every failure surfaced by the renderer core.
///
/// Validation failures (unknown identifiers, capacity, duplicates) are
/// programming errors and carry enough context to point at the offending call.
/// Driver failures (compile, link, framebuffer completeness) are fatal for the
/// frame and stop rendering.
#[derive(Error, Debug)]
pub enum RenderError {

    #[error("failed to compile {stage} stage of program '{name}':\n{log}")]
    ShaderCompile {
        name: String,
        stage: &'static str,
        log: String,
    },

    #[error("failed to link program '{name}':\n{log}")]
    ShaderLink {
        name: String,
        log: String,
    },

    #[error("program '{program}' has no uniform named '{name}'")]
    UnknownUniform {
        program: String,
        name: String,
    },

    #[error("uniform '{name}' is declared as {declared}, but a {provided} was supplied")]
    TypeMismatch {
        name: String,
        declared: String,
        provided: &'static str,
    },

    #[error("draw call {list} list is full (capacity {capacity})")]
    DrawCallFull {
        list: &'static str,
        capacity: usize,
    },

    #[error("identifier '{0}' exceeds the draw call name cap")]
    NameTooLong(String),

    #[error("identifier '{0}' was bound twice in one draw call")]
    DuplicateBinding(String),

    #[error("interface block '{name}' was declared with a different variable list by another program")]
    BlockLayoutMismatch {
        name: String,
    },

    #[error("{flavor} block binding points exhausted (driver maximum {max})")]
    BindingPointExhausted {
        flavor: &'static str,
        max: usize,
    },

    #[error("framebuffer is incomplete (status {status:#06x})")]
    FramebufferIncomplete {
        status: u32,
    },

    #[error("buffer storage is immutable; create it with DYNAMIC_STORAGE to resize or write")]
    BufferImmutable,

    #[error("buffer range at offset {offset} ({len} bytes) exceeds buffer size {size}")]
    BufferRange {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("vertex array layout is already fixed")]
    VaoLayoutFixed,

    #[error("draw submitted with a zero draw count")]
    EmptyDraw,

    #[error("dispatch on program '{0}', which is not a compute program")]
    NotCompute(String),

    #[error("draw submitted with compute program '{0}'")]
    NotRaster(String),

    #[error("collision query is degenerate: {0}")]
    GjkDegenerate(&'static str),

    #[error("program '{name}' is missing its {stage} stage source")]
    MissingStage {
        name: String,
        stage: &'static str,
    },

    #[error("invalid renderer configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
