#![forbid(unsafe_code)]

//! Declarative view descriptions.
//!
//! A [`View`] is a tree of node values: text, progress bars, row and
//! column containers, conditionals, iteration, selection lists, styled
//! spans, and embedded layers. The tree is compiled **once** by
//! [`compile`](crate::compile::compile) into a flat [`Template`] whose
//! per-frame execution performs no type inspection.
//!
//! # Value access
//!
//! Every value-bearing node reads its live value one of two ways,
//! decided at construction:
//!
//! - **static**: a literal baked into the op;
//! - **bound**: a closure over the caller's binding state `S`.
//!
//! Iteration bodies are `View<E>` trees whose bound closures take the
//! element `&E` directly: the sub-template's binding state *is* the
//! element, which is what makes per-element reads free of any offset
//! bookkeeping.
//!
//! # Example
//!
//! ```
//! use stencil_template::view::View;
//!
//! struct App { items: Vec<String>, selected: usize }
//! fn items(app: &App) -> &[String] { &app.items }
//!
//! let view: View<App> = View::column(vec![
//!     View::text("Tasks").bold(),
//!     View::select_list(
//!         items,
//!         |app: &App| app.selected,
//!         "> ",
//!         5,
//!         View::text_bound(|item: &String| item.clone()),
//!     ),
//! ]);
//! ```

use std::rc::Rc;

use stencil_render::cell::Span;
use stencil_render::layer::Layer;

use crate::compile::CompileError;
use crate::exec::{ForEachDriver, SelectListDriver};
use crate::op::{IterDriver, SelectDriver};

/// How an op reads its live value: a compile-time literal or a closure
/// over the binding state.
pub enum ValueSource<S, T> {
    /// Literal known at compile time.
    Static(T),
    /// Read from caller state every frame.
    Bound(Rc<dyn Fn(&S) -> T>),
}

impl<S, T: Clone> ValueSource<S, T> {
    #[inline]
    pub(crate) fn resolve(&self, state: &S) -> T {
        match self {
            Self::Static(value) => value.clone(),
            Self::Bound(read) => read(state),
        }
    }
}

pub(crate) type BoolFn<S> = Rc<dyn Fn(&S) -> bool>;
pub(crate) type IndexFn<S> = Rc<dyn Fn(&S) -> usize>;
pub(crate) type ItemsFn<S, E> = Rc<dyn for<'a> Fn(&'a S) -> &'a [E]>;
pub(crate) type LayerFn<S> = Rc<dyn for<'a> Fn(&'a S) -> &'a Layer>;

/// Capability set for a typed conditional: evaluated every frame, with
/// branch sub-trees surrendered once at compile time.
pub trait ConditionNode<S> {
    /// Decide which branch is live this frame.
    fn evaluate(&self, state: &S) -> bool;
    /// The sub-tree rendered when [`ConditionNode::evaluate`] is true.
    fn then_branch(&self) -> View<S>;
    /// The sub-tree rendered otherwise, if any.
    fn else_branch(&self) -> Option<View<S>> {
        None
    }
}

/// Capability set for a typed multi-way switch.
pub trait SwitchNode<S> {
    /// Index of the live case this frame; out-of-range selects the
    /// default case (or nothing).
    fn match_index(&self, state: &S) -> usize;
    /// The case sub-trees, surrendered once at compile time.
    fn cases(&self) -> Vec<View<S>>;
    /// Fallback sub-tree for out-of-range indices.
    fn default_case(&self) -> Option<View<S>> {
        None
    }
}

/// Type-erased ForEach payload: knows its element type internally and
/// compiles itself into an iteration driver.
pub(crate) trait IterBody<S> {
    fn compile_body(self: Box<Self>) -> Result<Box<dyn IterDriver<S>>, CompileError>;
}

/// Type-erased selection-list payload.
pub(crate) trait SelectBody<S> {
    fn compile_body(self: Box<Self>) -> Result<Box<dyn SelectDriver<S>>, CompileError>;
}

/// Opaque ForEach payload; built by [`View::for_each`].
pub struct ForEachView<S>(pub(crate) Box<dyn IterBody<S>>);

/// Opaque selection-list payload; built by [`View::select_list`].
pub struct SelectListView<S>(pub(crate) Box<dyn SelectBody<S>>);

pub(crate) struct ForEachBody<S, E> {
    pub(crate) items: ItemsFn<S, E>,
    pub(crate) body: View<E>,
}

impl<S: 'static, E: 'static> IterBody<S> for ForEachBody<S, E> {
    fn compile_body(self: Box<Self>) -> Result<Box<dyn IterDriver<S>>, CompileError> {
        let body = crate::compile::compile(self.body)?;
        Ok(Box::new(ForEachDriver::new(self.items, body)))
    }
}

pub(crate) struct SelectListBody<S, E> {
    pub(crate) items: ItemsFn<S, E>,
    pub(crate) selected: IndexFn<S>,
    pub(crate) marker: String,
    pub(crate) max_visible: usize,
    pub(crate) body: View<E>,
}

impl<S: 'static, E: 'static> SelectBody<S> for SelectListBody<S, E> {
    fn compile_body(self: Box<Self>) -> Result<Box<dyn SelectDriver<S>>, CompileError> {
        if self.max_visible == 0 {
            return Err(CompileError::EmptySelectionWindow);
        }
        let body = crate::compile::compile(self.body)?;
        Ok(Box::new(SelectListDriver::new(
            self.items,
            self.selected,
            self.marker,
            self.max_visible,
            body,
        )))
    }
}

/// A declarative view node over binding state `S`.
pub enum View<S> {
    /// A single line of text, optionally bold.
    Text {
        /// Content, static or bound.
        value: ValueSource<S, String>,
        /// Render bold.
        bold: bool,
    },
    /// A progress bar of fixed cell width.
    Progress {
        /// Fill ratio in `[0, 1]`, clamped at render.
        value: ValueSource<S, f64>,
        /// Bar width in cells.
        width: u16,
    },
    /// A line of styled spans.
    Spans {
        /// The runs, static or bound.
        value: ValueSource<S, Vec<Span>>,
    },
    /// Horizontal container.
    Row {
        /// Child nodes, laid out left to right.
        children: Vec<View<S>>,
        /// Cells inserted between children.
        gap: u16,
    },
    /// Vertical container.
    Column {
        /// Child nodes, laid out top to bottom.
        children: Vec<View<S>>,
        /// Rows inserted between children.
        gap: u16,
    },
    /// Conditional branch on a bound boolean.
    When {
        /// Evaluated every frame.
        cond: BoolFn<S>,
        /// Rendered when the condition holds.
        then: Box<View<S>>,
        /// Rendered when it does not.
        otherwise: Option<Box<View<S>>>,
    },
    /// Else-branch written as a sibling; pairs with the nearest
    /// preceding conditional at compile time.
    Otherwise {
        /// Rendered when the paired conditional did not take its branch.
        body: Box<View<S>>,
    },
    /// Typed conditional capability.
    Condition(Box<dyn ConditionNode<S>>),
    /// Typed multi-way switch capability.
    Switch(Box<dyn SwitchNode<S>>),
    /// Iteration over a bound slice.
    ForEach(ForEachView<S>),
    /// Windowed, marker-prefixed iteration with a live selection.
    SelectList(SelectListView<S>),
    /// Scrollable layer window.
    LayerView {
        /// Resolves the layer against caller state every frame.
        layer: LayerFn<S>,
        /// Window width in cells.
        width: u16,
        /// Window height in cells.
        height: u16,
    },
}

impl<S: 'static> View<S> {
    /// Static text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            value: ValueSource::Static(text.into()),
            bold: false,
        }
    }

    /// Text read from state every frame.
    pub fn text_bound(read: impl Fn(&S) -> String + 'static) -> Self {
        Self::Text {
            value: ValueSource::Bound(Rc::new(read)),
            bold: false,
        }
    }

    /// Render this text node bold. No effect on other node kinds.
    pub fn bold(mut self) -> Self {
        if let Self::Text { bold, .. } = &mut self {
            *bold = true;
        }
        self
    }

    /// Progress bar with a static ratio.
    pub fn progress(ratio: f64, width: u16) -> Self {
        Self::Progress {
            value: ValueSource::Static(ratio),
            width,
        }
    }

    /// Progress bar whose ratio is read from state every frame.
    pub fn progress_bound(read: impl Fn(&S) -> f64 + 'static, width: u16) -> Self {
        Self::Progress {
            value: ValueSource::Bound(Rc::new(read)),
            width,
        }
    }

    /// Static styled spans.
    pub fn spans(spans: Vec<Span>) -> Self {
        Self::Spans {
            value: ValueSource::Static(spans),
        }
    }

    /// Styled spans read from state every frame.
    pub fn spans_bound(read: impl Fn(&S) -> Vec<Span> + 'static) -> Self {
        Self::Spans {
            value: ValueSource::Bound(Rc::new(read)),
        }
    }

    /// Horizontal container with no gap.
    pub fn row(children: Vec<View<S>>) -> Self {
        Self::Row { children, gap: 0 }
    }

    /// Vertical container with no gap.
    pub fn column(children: Vec<View<S>>) -> Self {
        Self::Column { children, gap: 0 }
    }

    /// Set the inter-child gap of a row or column. No effect on other
    /// node kinds.
    pub fn gap(mut self, gap: u16) -> Self {
        match &mut self {
            Self::Row { gap: g, .. } | Self::Column { gap: g, .. } => *g = gap,
            _ => {}
        }
        self
    }

    /// Render `then` when `cond` holds.
    pub fn when(cond: impl Fn(&S) -> bool + 'static, then: View<S>) -> Self {
        Self::When {
            cond: Rc::new(cond),
            then: Box::new(then),
            otherwise: None,
        }
    }

    /// Render `then` when `cond` holds, `otherwise` when it does not.
    pub fn when_else(
        cond: impl Fn(&S) -> bool + 'static,
        then: View<S>,
        otherwise: View<S>,
    ) -> Self {
        Self::When {
            cond: Rc::new(cond),
            then: Box::new(then),
            otherwise: Some(Box::new(otherwise)),
        }
    }

    /// Sibling else-branch for the nearest preceding conditional.
    pub fn otherwise(body: View<S>) -> Self {
        Self::Otherwise {
            body: Box::new(body),
        }
    }

    /// Typed conditional capability.
    pub fn condition(node: impl ConditionNode<S> + 'static) -> Self {
        Self::Condition(Box::new(node))
    }

    /// Typed switch capability.
    pub fn switch(node: impl SwitchNode<S> + 'static) -> Self {
        Self::Switch(Box::new(node))
    }

    /// Render `body` once per element of the bound slice.
    pub fn for_each<E: 'static>(
        items: impl for<'a> Fn(&'a S) -> &'a [E] + 'static,
        body: View<E>,
    ) -> Self {
        Self::ForEach(ForEachView(Box::new(ForEachBody {
            items: Rc::new(items),
            body,
        })))
    }

    /// Windowed selection list: at most `max_visible` items are shown,
    /// the selected one prefixed with `marker`, the rest with spaces of
    /// equal width.
    pub fn select_list<E: 'static>(
        items: impl for<'a> Fn(&'a S) -> &'a [E] + 'static,
        selected: impl Fn(&S) -> usize + 'static,
        marker: impl Into<String>,
        max_visible: usize,
        body: View<E>,
    ) -> Self {
        Self::SelectList(SelectListView(Box::new(SelectListBody {
            items: Rc::new(items),
            selected: Rc::new(selected),
            marker: marker.into(),
            max_visible,
            body,
        })))
    }

    /// A `width` × `height` window onto a scrollable layer.
    pub fn layer(
        layer: impl for<'a> Fn(&'a S) -> &'a Layer + 'static,
        width: u16,
        height: u16,
    ) -> Self {
        Self::LayerView {
            layer: Rc::new(layer),
            width,
            height,
        }
    }
}
