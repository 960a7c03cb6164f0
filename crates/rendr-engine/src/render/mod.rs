//! GPU rendering subsystem.
//!
//! Leaf-first:
//! - [`GeometryBuffer`]: fixed-usage vertex or index buffer
//! - [`ShaderProgram`]: compiled vertex + fragment pair with a reflected
//!   attribute/uniform table; builds [`VertexArray`]s and bind groups by name
//! - [`Geometry`]: vertex array + draw range (plain or indexed)
//! - [`MsaaFrame`]: multisampled render target + single-sample resolve target
//! - [`CompositePass`]: renders into an `MsaaFrame`, resolves it and draws the
//!   result onto the output with a fullscreen quad
//!
//! Every GPU object here is owned by whoever created it and released
//! explicitly (`release`) before being replaced.

mod attrib;
mod buffer;
mod composite;
mod ctx;
mod error;
mod geometry;
mod msaa;
mod program;
mod uniform;

pub use attrib::{AttribDesc, ScalarKind};
pub use buffer::{BufferKind, GeometryBuffer};
pub use composite::CompositePass;
pub use ctx::{RenderCtx, RenderTarget};
pub use error::{FrameError, ShaderError, ShaderStage};
pub use geometry::{DrawRange, Geometry};
pub use msaa::{FrameState, MsaaConfig, MsaaFrame, DEFAULT_SAMPLE_COUNT};
pub use program::{
    AttribSlot, ProgramDesc, ProgramLayout, ProgramTarget, ShaderProgram, StageDesc, UniformSlot,
    VertexArray, VertexStageDesc,
};
pub use uniform::UniformBuffer;
