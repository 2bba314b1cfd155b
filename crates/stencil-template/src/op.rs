#![forbid(unsafe_code)]

//! Compiled templates: flat op records and runtime scratch.
//!
//! Compilation flattens a [`View`](crate::view::View) tree into a vector
//! of uniform [`Op`] records in document order. Each op carries a parent
//! index and a nesting depth; a depth-indexed side table groups op
//! indices by level. Conditional and iterative ops own the compiled
//! sub-templates of their branches or bodies.
//!
//! The scratch vectors are part of the template so their capacity
//! survives across frames: both are truncated, never freed, at the start
//! of every execute.

use std::rc::Rc;

use stencil_render::cell::Span;
use stencil_render::layer::Layer;

use crate::view::{BoolFn, ConditionNode, SwitchNode, ValueSource};

/// Resolves a layer against live state at render time; `None` when the
/// element that carried it is gone this frame.
pub(crate) type LayerResolveFn<S> = Rc<dyn for<'a> Fn(&'a S) -> Option<&'a Layer>>;

/// One compiled operation.
pub(crate) struct Op<S> {
    pub(crate) kind: OpKind<S>,
    /// Index of the enclosing container op; self-referential for roots.
    pub(crate) parent: usize,
    /// Layout nesting level.
    pub(crate) depth: u16,
}

/// The closed set of op kinds.
pub(crate) enum OpKind<S> {
    Text {
        value: ValueSource<S, String>,
        bold: bool,
    },
    Progress {
        value: ValueSource<S, f64>,
        width: u16,
    },
    Spans {
        value: ValueSource<S, Vec<Span>>,
    },
    RowStart {
        gap: u16,
    },
    RowEnd,
    ColStart {
        gap: u16,
    },
    ColEnd,
    If {
        cond: BoolFn<S>,
        body: Template<S>,
    },
    Else {
        body: Template<S>,
    },
    Cond {
        node: Box<dyn ConditionNode<S>>,
        then_body: Template<S>,
        else_body: Option<Template<S>>,
    },
    Switch {
        node: Box<dyn SwitchNode<S>>,
        cases: Vec<Template<S>>,
        default_body: Option<Template<S>>,
    },
    ForEach {
        driver: Box<dyn IterDriver<S>>,
    },
    SelectList {
        driver: Box<dyn SelectDriver<S>>,
    },
    LayerView {
        resolve: LayerResolveFn<S>,
        width: u16,
        height: u16,
    },
}

/// Type-erased iteration executor: owns the element-typed body template
/// and runs a self-contained measure per element.
pub(crate) trait IterDriver<S> {
    /// Measure every element at `origin`, appending nodes to `out` with
    /// a cumulative offset along the parent's flow axis. Returns the
    /// total extent.
    fn measure(
        &mut self,
        state: &S,
        out: &mut Vec<Node<S>>,
        origin: (u16, u16),
        along_row: bool,
    ) -> (u16, u16);
}

/// Type-erased selection-list executor. Holds the persistent window
/// offset between frames.
pub(crate) trait SelectDriver<S> {
    /// Measure the visible window at `origin`. Returns the total extent.
    fn measure(&mut self, state: &S, out: &mut Vec<Node<S>>, origin: (u16, u16)) -> (u16, u16);
}

/// Measured node, produced by the measure pass and consumed by the
/// render pass. Never retained across frames.
pub(crate) struct Node<S> {
    pub(crate) x: u16,
    pub(crate) y: u16,
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) content: NodeContent<S>,
}

pub(crate) enum NodeContent<S> {
    Text { text: String, bold: bool },
    Progress { ratio: f64 },
    Spans { spans: Vec<Span> },
    Layer { resolve: LayerResolveFn<S> },
}

/// One frame of the layout stack: an open row or column container.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LayoutCtx {
    /// Cursor.
    pub(crate) x: u16,
    pub(crate) y: u16,
    /// Container origin, for extent computation at close.
    pub(crate) start_x: u16,
    pub(crate) start_y: u16,
    /// Horizontal flow when true, vertical otherwise.
    pub(crate) is_row: bool,
    /// Cells inserted before every child but the first.
    pub(crate) gap: u16,
    /// Cross-axis maxima.
    pub(crate) max_w: u16,
    pub(crate) max_h: u16,
    pub(crate) first_child: bool,
}

impl LayoutCtx {
    pub(crate) fn open(x: u16, y: u16, is_row: bool, gap: u16) -> Self {
        Self {
            x,
            y,
            start_x: x,
            start_y: y,
            is_row,
            gap,
            max_w: 0,
            max_h: 0,
            first_child: true,
        }
    }
}

/// Reusable per-frame scratch. Truncation keeps capacity, so per-frame
/// allocation is bounded by net growth in visible content.
pub(crate) struct Scratch<S> {
    pub(crate) nodes: Vec<Node<S>>,
    pub(crate) stack: Vec<LayoutCtx>,
}

impl<S> Default for Scratch<S> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            stack: Vec::new(),
        }
    }
}

/// A compiled view: flat ops, the by-depth index, and reusable scratch.
///
/// Build one with [`compile`](crate::compile::compile), then call
/// [`Template::execute`] every frame. A template must not be executed
/// concurrently; the scratch is shared state.
pub struct Template<S> {
    pub(crate) ops: Vec<Op<S>>,
    pub(crate) by_level: Vec<Vec<usize>>,
    pub(crate) scratch: Scratch<S>,
}

impl<S> std::fmt::Debug for Template<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("op_count", &self.ops.len())
            .field("level_count", &self.by_level.len())
            .finish()
    }
}

impl<S> Template<S> {
    /// Number of compiled ops.
    #[inline]
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Number of distinct nesting levels.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.by_level.len()
    }

    /// Indices of the ops at nesting level `depth`, in document order.
    pub fn ops_at_level(&self, depth: usize) -> &[usize] {
        self.by_level.get(depth).map_or(&[], Vec::as_slice)
    }

    /// Parent op index of op `index`; roots are their own parent.
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.ops.get(index).map(|op| op.parent)
    }
}
