#![forbid(unsafe_code)]

//! Declarative views compiled once into flat op templates.
//!
//! The pipeline is compile-once, execute-per-frame:
//!
//! ```text
//! View tree  --compile-->  Template { flat ops, by-level index, scratch }
//!                              |
//!                              v  execute(state, buf) every frame
//!                          measure + layout + render into a Buffer
//! ```
//!
//! See [`view::View`] for the node kinds and [`op::Template`] for the
//! execution surface.

pub mod compile;
pub mod exec;
pub mod op;
pub mod view;

pub use compile::{CompileError, compile};
pub use op::Template;
pub use view::{ConditionNode, SwitchNode, ValueSource, View};
