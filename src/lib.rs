//! Runtime for block scripts attached to objects in an editable 3D world.
//!
//! Scripts are trees of event, control and action blocks. Each running script is a resumable
//! [`ScriptContext`] that the host advances once per frame through [`World::tick`]; actions move,
//! rotate, scale and recolor the owning object, optionally tweened over time.

pub mod block;
pub mod color;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod json;
pub mod preview;
pub mod script;
pub mod stepper;
pub mod tween;
pub mod world;

pub use block::{Axis, BlockKind, BlockType, Parameters, Value};
pub use color::Color;
pub use config::Config;
pub use context::{Action, Frame, ScriptContext, Tween};
pub use entity::{Entity, EntityData, EntityState, ObjectKind, Transform};
pub use error::{Error, Result};
pub use script::{BlockId, Script};
pub use world::{ObjectUpdate, World};
