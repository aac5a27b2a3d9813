//! Viewport collaborator for the Easel canvas viewer.
//!
//! Thin by design: named canvas objects over the geometry kernel's
//! shapes, ordered layers with hit testing, a command/commit skeleton
//! with undo and redo, and the host-function bindings that let VM
//! scripts drive the canvas.

pub mod command;
pub mod gobject;
pub mod layer;
pub mod scene;
pub mod viewport;

pub use command::{AddObject, CommitLog, RemoveObject, Translate, ViewportCommand};
pub use gobject::{GObject, GObjectId};
pub use layer::CanvasLayer;
pub use scene::{load_scene, save_scene, NodeDesc, ObjectDesc, SceneDesc, ShapeDesc};
pub use viewport::{install_bindings, Viewport};
