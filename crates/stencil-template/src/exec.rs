#![forbid(unsafe_code)]

//! Template execution: the per-frame measure, layout, and render walk.
//!
//! Each execute performs two phases in one call:
//!
//! 1. **Measure + layout**: a single forward pass over the flat ops.
//!    A stack of [`LayoutCtx`] frames models open row/column containers;
//!    leaf ops read their live values and append positioned nodes to the
//!    scratch. Conditional and iterative ops run their sub-templates
//!    self-contained and copy the emitted nodes out with an offset.
//! 2. **Render**: a linear scan over the measured nodes dispatching to
//!    the buffer fast paths and layer blits.
//!
//! No allocation happens beyond net growth of visible content, no error
//! is ever returned, and out-of-bounds content is silently clipped by
//! the buffer.

use std::rc::Rc;

use stencil_render::buffer::Buffer;
use stencil_render::cell::Span;
use stencil_render::style::{Style, display_width, glyph_width};

use crate::op::{
    IterDriver, LayerResolveFn, LayoutCtx, Node, NodeContent, OpKind, Scratch, SelectDriver,
    Template,
};
use crate::view::{IndexFn, ItemsFn};

const STACK_INVARIANT: &str = "layout stack holds the root context";

impl<S: 'static> Template<S> {
    /// Execute one frame: measure, lay out, and render into `buf`.
    ///
    /// Writes cells within the buffer bounds; dirty tracking is updated
    /// by the buffer writes. Must not be called concurrently on the same
    /// template; the scratch is shared.
    pub fn execute(&mut self, state: &S, buf: &mut Buffer) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "template_execute",
            ops = self.ops.len(),
            w = buf.width(),
            h = buf.height()
        )
        .entered();
        self.measure_layout(state);
        self.render_nodes(state, buf, false);
    }

    /// Like [`Template::execute`] but text nodes pad their field with
    /// styled spaces, so callers with stable UI structure can skip
    /// clearing the buffer between frames.
    pub fn execute_padded(&mut self, state: &S, buf: &mut Buffer) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "template_execute",
            ops = self.ops.len(),
            w = buf.width(),
            h = buf.height()
        )
        .entered();
        self.measure_layout(state);
        self.render_nodes(state, buf, true);
    }

    /// Measure pass: fill the node scratch with positioned nodes and
    /// return the root extent. Positions are relative to (0, 0) so
    /// callers embedding this template can offset the emitted nodes.
    pub(crate) fn measure_layout(&mut self, state: &S) -> (u16, u16) {
        let Template { ops, scratch, .. } = self;
        let Scratch { nodes, stack } = scratch;
        nodes.clear();
        stack.clear();
        stack.push(LayoutCtx::open(0, 0, false, 0));
        // true once the preceding conditional has settled its false
        // path (branch taken, or an owned else/default rendered); an
        // Else op runs only while this is false
        let mut branch_handled = true;

        for op in ops.iter_mut() {
            match &mut op.kind {
                OpKind::Text { value, bold } => {
                    let text = value.resolve(state);
                    let w = clamp_w(display_width(&text));
                    place_leaf(
                        stack,
                        nodes,
                        NodeContent::Text {
                            text,
                            bold: *bold,
                        },
                        w,
                        1,
                    );
                }
                OpKind::Progress { value, width } => {
                    let ratio = value.resolve(state);
                    place_leaf(stack, nodes, NodeContent::Progress { ratio }, *width, 1);
                }
                OpKind::Spans { value } => {
                    let spans = value.resolve(state);
                    let w = clamp_w(spans_width(&spans));
                    place_leaf(stack, nodes, NodeContent::Spans { spans }, w, 1);
                }
                OpKind::RowStart { gap } => {
                    let (x, y) = child_origin(stack.last().expect(STACK_INVARIANT));
                    stack.push(LayoutCtx::open(x, y, true, *gap));
                }
                OpKind::ColStart { gap } => {
                    let (x, y) = child_origin(stack.last().expect(STACK_INVARIANT));
                    stack.push(LayoutCtx::open(x, y, false, *gap));
                }
                OpKind::RowEnd | OpKind::ColEnd => close_container(stack),
                OpKind::If { cond, body } => {
                    let taken = cond(state);
                    if taken {
                        place_block(stack, nodes, state, body);
                    }
                    branch_handled = taken;
                }
                OpKind::Else { body } => {
                    if !branch_handled {
                        place_block(stack, nodes, state, body);
                    }
                    branch_handled = true;
                }
                OpKind::Cond {
                    node,
                    then_body,
                    else_body,
                } => {
                    if node.evaluate(state) {
                        place_block(stack, nodes, state, then_body);
                        branch_handled = true;
                    } else if let Some(body) = else_body {
                        place_block(stack, nodes, state, body);
                        branch_handled = true;
                    } else {
                        branch_handled = false;
                    }
                }
                OpKind::Switch {
                    node,
                    cases,
                    default_body,
                } => {
                    let index = node.match_index(state);
                    if let Some(body) = cases.get_mut(index) {
                        place_block(stack, nodes, state, body);
                        branch_handled = true;
                    } else if let Some(body) = default_body.as_mut() {
                        place_block(stack, nodes, state, body);
                        branch_handled = true;
                    } else {
                        branch_handled = false;
                    }
                }
                OpKind::ForEach { driver } => {
                    let ctx = *stack.last().expect(STACK_INVARIANT);
                    let (w, h) = driver.measure(state, nodes, child_origin(&ctx), ctx.is_row);
                    if w > 0 || h > 0 {
                        commit_child(stack.last_mut().expect(STACK_INVARIANT), w, h);
                    }
                }
                OpKind::SelectList { driver } => {
                    let ctx = *stack.last().expect(STACK_INVARIANT);
                    let (w, h) = driver.measure(state, nodes, child_origin(&ctx));
                    if w > 0 || h > 0 {
                        commit_child(stack.last_mut().expect(STACK_INVARIANT), w, h);
                    }
                }
                OpKind::LayerView {
                    resolve,
                    width,
                    height,
                } => {
                    place_leaf(
                        stack,
                        nodes,
                        NodeContent::Layer {
                            resolve: resolve.clone(),
                        },
                        *width,
                        *height,
                    );
                }
            }
        }

        let root = stack.pop().expect(STACK_INVARIANT);
        (root.max_w, root.y - root.start_y)
    }

    /// Render pass: write the measured nodes into the buffer.
    fn render_nodes(&self, state: &S, buf: &mut Buffer, padded: bool) {
        for node in &self.scratch.nodes {
            match &node.content {
                NodeContent::Text { text, bold } => {
                    let style = if *bold {
                        Style::new().bold()
                    } else {
                        Style::DEFAULT
                    };
                    if padded {
                        // pad to the end of the line; siblings to the
                        // right repaint over the pad in document order
                        let field = buf.width().saturating_sub(node.x);
                        buf.write_str_padded(node.x, node.y, text, style, field);
                    } else {
                        buf.write_str_fast(node.x, node.y, text, style, node.w);
                    }
                }
                NodeContent::Progress { ratio } => {
                    buf.write_progress_bar(node.x, node.y, node.w, *ratio, Style::DEFAULT);
                }
                NodeContent::Spans { spans } => {
                    buf.write_spans(node.x, node.y, spans, node.w);
                }
                NodeContent::Layer { resolve } => {
                    if let Some(layer) = resolve(state) {
                        layer.blit_into(buf, node.x, node.y, node.w, node.h);
                    }
                }
            }
        }
    }
}

#[inline]
fn clamp_w(w: usize) -> u16 {
    w.min(u16::MAX as usize) as u16
}

/// Span measurement matches the positioning rule of
/// [`Buffer::write_spans`]: width-0 runes are promoted to one cell.
fn spans_width(spans: &[Span]) -> usize {
    spans
        .iter()
        .map(|span| {
            span.text
                .chars()
                .map(|c| glyph_width(c).max(1))
                .sum::<usize>()
        })
        .sum()
}

/// Cursor position the next child will occupy, gap included.
fn child_origin(ctx: &LayoutCtx) -> (u16, u16) {
    if ctx.first_child {
        (ctx.x, ctx.y)
    } else if ctx.is_row {
        (ctx.x.saturating_add(ctx.gap), ctx.y)
    } else {
        (ctx.x, ctx.y.saturating_add(ctx.gap))
    }
}

/// Fold a child extent into the open container: gap, cursor advance
/// along the flow axis, cross-axis maximum.
fn commit_child(ctx: &mut LayoutCtx, w: u16, h: u16) {
    if !ctx.first_child {
        if ctx.is_row {
            ctx.x = ctx.x.saturating_add(ctx.gap);
        } else {
            ctx.y = ctx.y.saturating_add(ctx.gap);
        }
    }
    ctx.first_child = false;
    if ctx.is_row {
        ctx.x = ctx.x.saturating_add(w);
        ctx.max_h = ctx.max_h.max(h);
    } else {
        ctx.y = ctx.y.saturating_add(h);
        ctx.max_w = ctx.max_w.max(w);
    }
}

fn place_leaf<S>(
    stack: &mut [LayoutCtx],
    nodes: &mut Vec<Node<S>>,
    content: NodeContent<S>,
    w: u16,
    h: u16,
) {
    let ctx = stack.last_mut().expect(STACK_INVARIANT);
    let (x, y) = child_origin(ctx);
    nodes.push(Node { x, y, w, h, content });
    commit_child(ctx, w, h);
}

/// Run a sub-template self-contained and splice its nodes in as one
/// block at the parent cursor. An empty block leaves the cursor alone,
/// so a not-taken branch consumes no gap.
fn place_block<S: 'static>(
    stack: &mut [LayoutCtx],
    nodes: &mut Vec<Node<S>>,
    state: &S,
    body: &mut Template<S>,
) {
    let (dx, dy) = child_origin(stack.last().expect(STACK_INVARIANT));
    let (w, h) = body.measure_layout(state);
    if w == 0 && h == 0 {
        return;
    }
    for mut node in body.scratch.nodes.drain(..) {
        node.x = node.x.saturating_add(dx);
        node.y = node.y.saturating_add(dy);
        nodes.push(node);
    }
    commit_child(stack.last_mut().expect(STACK_INVARIANT), w, h);
}

/// Close the top container and fold its extent into the parent.
fn close_container(stack: &mut Vec<LayoutCtx>) {
    let ctx = stack.pop().expect(STACK_INVARIANT);
    let (w, h) = if ctx.is_row {
        (ctx.x - ctx.start_x, ctx.max_h)
    } else {
        (ctx.max_w, ctx.y - ctx.start_y)
    };
    commit_child(stack.last_mut().expect(STACK_INVARIANT), w, h);
}

/// Move a node emitted by an element-typed sub-template into the outer
/// template's coordinate and state space. Only layer nodes carry state
/// dependence: their resolver is re-targeted through the slice accessor
/// and the element index, and yields `None` if the element is gone.
fn rebase_node<S: 'static, E: 'static>(
    node: Node<E>,
    dx: u16,
    dy: u16,
    items: &ItemsFn<S, E>,
    index: usize,
) -> Node<S> {
    let content = match node.content {
        NodeContent::Text { text, bold } => NodeContent::Text { text, bold },
        NodeContent::Progress { ratio } => NodeContent::Progress { ratio },
        NodeContent::Spans { spans } => NodeContent::Spans { spans },
        NodeContent::Layer { resolve } => {
            let items = items.clone();
            let resolve: LayerResolveFn<S> =
                Rc::new(move |state| items(state).get(index).and_then(|elem| resolve(elem)));
            NodeContent::Layer { resolve }
        }
    };
    Node {
        x: node.x.saturating_add(dx),
        y: node.y.saturating_add(dy),
        w: node.w,
        h: node.h,
        content,
    }
}

/// Iteration executor for a concrete element type.
pub(crate) struct ForEachDriver<S, E> {
    items: ItemsFn<S, E>,
    body: Template<E>,
}

impl<S, E> ForEachDriver<S, E> {
    pub(crate) fn new(items: ItemsFn<S, E>, body: Template<E>) -> Self {
        Self { items, body }
    }
}

impl<S: 'static, E: 'static> IterDriver<S> for ForEachDriver<S, E> {
    fn measure(
        &mut self,
        state: &S,
        out: &mut Vec<Node<S>>,
        origin: (u16, u16),
        along_row: bool,
    ) -> (u16, u16) {
        let Self { items, body } = self;
        let slice = items(state);
        let mut main = 0u16;
        let mut cross = 0u16;
        for (index, elem) in slice.iter().enumerate() {
            let (w, h) = body.measure_layout(elem);
            let (dx, dy) = if along_row {
                (origin.0.saturating_add(main), origin.1)
            } else {
                (origin.0, origin.1.saturating_add(main))
            };
            for node in body.scratch.nodes.drain(..) {
                out.push(rebase_node(node, dx, dy, items, index));
            }
            // every iteration advances by its own measured extent along
            // the parent's flow axis, at least one cell
            if along_row {
                main = main.saturating_add(w.max(1));
                cross = cross.max(h);
            } else {
                main = main.saturating_add(h.max(1));
                cross = cross.max(w);
            }
        }
        if along_row { (main, cross) } else { (cross, main) }
    }
}

/// Selection-list executor: windowed iteration with a marker prefix and
/// a persistent scroll offset.
pub(crate) struct SelectListDriver<S, E> {
    items: ItemsFn<S, E>,
    selected: IndexFn<S>,
    marker: String,
    /// Space run of the marker's display width, prefixed to unselected
    /// items so every row aligns.
    pad: String,
    marker_w: u16,
    max_visible: usize,
    /// First visible item; persists across frames so the window scrolls
    /// instead of jumping.
    offset: usize,
    body: Template<E>,
}

impl<S, E> SelectListDriver<S, E> {
    pub(crate) fn new(
        items: ItemsFn<S, E>,
        selected: IndexFn<S>,
        marker: String,
        max_visible: usize,
        body: Template<E>,
    ) -> Self {
        let marker_w = clamp_w(display_width(&marker));
        Self {
            items,
            selected,
            pad: " ".repeat(marker_w as usize),
            marker,
            marker_w,
            max_visible,
            offset: 0,
            body,
        }
    }
}

impl<S: 'static, E: 'static> SelectDriver<S> for SelectListDriver<S, E> {
    fn measure(&mut self, state: &S, out: &mut Vec<Node<S>>, origin: (u16, u16)) -> (u16, u16) {
        let Self {
            items,
            selected,
            marker,
            pad,
            marker_w,
            max_visible,
            offset,
            body,
        } = self;
        let slice = items(state);
        let len = slice.len();
        if len == 0 {
            *offset = 0;
            return (0, 0);
        }
        let sel = selected(state).min(len - 1);
        if *offset >= len {
            *offset = len - 1;
        }
        // keep the selection inside the window
        if sel < *offset {
            *offset = sel;
        } else if sel >= *offset + *max_visible {
            *offset = sel + 1 - *max_visible;
        }
        let end = (*offset + *max_visible).min(len);

        let mut cum_y = 0u16;
        let mut max_w = 0u16;
        for index in *offset..end {
            let (w, h) = body.measure_layout(&slice[index]);
            let first_node = out.len();
            for node in body.scratch.nodes.drain(..) {
                out.push(rebase_node(
                    node,
                    origin.0,
                    origin.1.saturating_add(cum_y),
                    items,
                    index,
                ));
            }
            let prefix = if index == sel {
                marker.as_str()
            } else {
                pad.as_str()
            };
            let mut item_w = w;
            if let Some(first) = out.get_mut(first_node) {
                let widened = match &mut first.content {
                    NodeContent::Text { text, .. } => {
                        text.insert_str(0, prefix);
                        true
                    }
                    NodeContent::Spans { spans } => {
                        spans.insert(0, Span::raw(prefix));
                        true
                    }
                    _ => false,
                };
                if widened {
                    first.w = first.w.saturating_add(*marker_w);
                    item_w = item_w.saturating_add(*marker_w);
                }
            }
            max_w = max_w.max(item_w);
            cum_y = cum_y.saturating_add(h.max(1));
        }
        (max_w, cum_y)
    }
}
