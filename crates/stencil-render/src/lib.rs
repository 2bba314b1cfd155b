#![forbid(unsafe_code)]

//! Render kernel: cells, styles, the buffer grid, double buffering, and
//! scrollable layers.
//!
//! This crate has no knowledge of views or templates; the template layer
//! builds on it, never the other way around.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod layer;
pub mod pool;
pub mod style;

pub use buffer::{BAR_EMPTY_BG, Buffer};
pub use cell::{CONTINUATION, Cell, Span};
pub use layer::{Layer, LayerCursor};
pub use pool::BufferPool;
pub use style::{AttrFlags, Color, Style, display_width, glyph_width};
