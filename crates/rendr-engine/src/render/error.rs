use std::fmt;

use super::{BufferKind, FrameState, ScalarKind};

/// Programmable stage a shader source belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX",
            ShaderStage::Fragment => "FRAGMENT",
        }
    }

    pub(crate) const fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error building a [`ShaderProgram`](super::ShaderProgram) or binding data to it.
///
/// Compile and link failures are fatal to program construction; there is no
/// retry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// A stage failed to parse or validate. `log` is the compiler diagnostic.
    Compile { stage: ShaderStage, log: String },
    /// The stages compiled but do not form a usable program.
    Link(String),
    /// An attribute declaration has no vertex format.
    UnsupportedFormat {
        name: String,
        size: u8,
        kind: ScalarKind,
        normalized: bool,
    },
    /// Only per-vertex (0) and per-instance (1) stepping exist.
    UnsupportedDivisor { name: String, divisor: u32 },
    /// A binding names an attribute the program does not declare.
    UnknownAttribute(String),
    /// A declared attribute was left without a buffer.
    MissingBinding(String),
    /// The same attribute was given two buffers.
    DuplicateBinding(String),
    /// An index buffer was bound where vertex data is expected, or vice versa.
    WrongBufferKind { name: String, kind: BufferKind },
    /// A bind group entry names a uniform the program does not declare.
    UnknownUniform(String),
    /// Bind group entries span more than one group.
    MixedUniformGroups { expected: u32, found: u32 },
    /// A bind group was requested with no entries.
    NoUniforms,
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile { stage, log } => write!(f, "couldn't compile {stage}: {log}"),
            ShaderError::Link(log) => write!(f, "couldn't link program: {log}"),
            ShaderError::UnsupportedFormat {
                name,
                size,
                kind,
                normalized,
            } => write!(
                f,
                "attribute `{name}`: no vertex format for {size} x {kind:?} (normalized: {normalized})"
            ),
            ShaderError::UnsupportedDivisor { name, divisor } => {
                write!(f, "attribute `{name}`: unsupported instance divisor {divisor}")
            }
            ShaderError::UnknownAttribute(name) => {
                write!(f, "attribute `{name}` is not declared by the program")
            }
            ShaderError::MissingBinding(name) => write!(f, "no buffer bound for attribute `{name}`"),
            ShaderError::DuplicateBinding(name) => {
                write!(f, "attribute `{name}` bound more than once")
            }
            ShaderError::WrongBufferKind { name, kind } => {
                write!(f, "attribute `{name}` bound to a {kind:?} buffer")
            }
            ShaderError::UnknownUniform(name) => {
                write!(f, "uniform `{name}` is not declared by the program")
            }
            ShaderError::MixedUniformGroups { expected, found } => {
                write!(f, "uniforms span bind groups {expected} and {found}")
            }
            ShaderError::NoUniforms => f.write_str("bind group requested with no uniforms"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Misuse of the [`MsaaFrame`](super::MsaaFrame) bind → blit → unbind cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameError {
    InvalidTransition { from: FrameState, to: FrameState },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::InvalidTransition { from, to } => {
                write!(f, "msaa frame cannot go from {from:?} to {to:?}")
            }
        }
    }
}

impl std::error::Error for FrameError {}
