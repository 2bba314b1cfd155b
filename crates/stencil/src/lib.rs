#![forbid(unsafe_code)]

//! Stencil: a compiled-template terminal rendering engine.
//!
//! A declarative view description is compiled once into a flat op list;
//! per-frame execution is a tight walk that produces a styled cell grid
//! ready for diffing against the previous frame. This facade re-exports
//! the public surface of the kernel and template crates.
//!
//! # Quick start
//!
//! ```
//! use stencil::prelude::*;
//!
//! struct App { items: Vec<String>, selected: usize }
//! fn items(app: &App) -> &[String] { &app.items }
//!
//! let view: View<App> = View::column(vec![
//!     View::text("Fruit").bold(),
//!     View::select_list(
//!         items,
//!         |app: &App| app.selected,
//!         "> ",
//!         5,
//!         View::text_bound(|item: &String| item.clone()),
//!     ),
//! ]);
//!
//! let mut template = compile(view).unwrap();
//! let app = App {
//!     items: vec!["Apple".into(), "Banana".into(), "Cherry".into()],
//!     selected: 1,
//! };
//! let mut buf = Buffer::new(20, 4);
//! template.execute(&app, &mut buf);
//! assert_eq!(buf.line(1), "> Banana");
//! ```

pub use stencil_render as render;
pub use stencil_template as template;

pub use stencil_render::ansi;
pub use stencil_render::buffer::{BAR_EMPTY_BG, Buffer};
pub use stencil_render::cell::{CONTINUATION, Cell, Span};
pub use stencil_render::layer::{Layer, LayerCursor};
pub use stencil_render::pool::BufferPool;
pub use stencil_render::style::{AttrFlags, Color, Style, display_width, glyph_width};
pub use stencil_template::compile::{CompileError, compile};
pub use stencil_template::op::Template;
pub use stencil_template::view::{ConditionNode, SwitchNode, ValueSource, View};

/// Common imports for applications.
pub mod prelude {
    pub use crate::{
        AttrFlags, Buffer, BufferPool, Cell, Color, CompileError, ConditionNode, Layer,
        LayerCursor, Span, Style, SwitchNode, Template, View, compile,
    };
}
