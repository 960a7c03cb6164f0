//! Fern demo: a baked 2D mesh drawn through the MSAA composite pass.

pub mod app;
pub mod camera;
pub mod mesh;
pub mod scene;

pub use app::FernApp;
pub use mesh::{FernMesh, MeshError};
pub use scene::{FernScene, SceneConfig};
