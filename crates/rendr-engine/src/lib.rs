//! rendr engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the demo binaries:
//! device/surface acquisition, the window loop, and the small set of render
//! primitives (buffers, shader programs, geometry, the MSAA composite pass).

pub mod device;
pub mod window;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
