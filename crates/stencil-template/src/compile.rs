#![forbid(unsafe_code)]

//! One-shot template compilation.
//!
//! `compile` flattens a view tree into the flat op list in document
//! order, assigns parent and depth per op, builds the by-depth index,
//! and recursively compiles every conditional branch and iteration body
//! into its own sub-template. All type inspection happens here; the
//! per-frame walk never sees a view node again.

use std::rc::Rc;

use crate::op::{LayerResolveFn, Op, OpKind, Scratch, Template};
use crate::view::View;

/// Errors surfaced while compiling a view tree.
///
/// Compilation is the only fallible step; execution is panic-free and
/// infallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileError {
    /// An else-branch whose immediate predecessor in its container is
    /// not a conditional.
    ElseWithoutIf,
    /// A switch capability with no cases and no default.
    EmptySwitch,
    /// A selection list compiled with a zero-row window.
    EmptySelectionWindow,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ElseWithoutIf => {
                write!(f, "otherwise-branch has no preceding conditional to pair with")
            }
            Self::EmptySwitch => write!(f, "switch has no cases and no default"),
            Self::EmptySelectionWindow => {
                write!(f, "selection list window must show at least one row")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Compile a view tree into a reusable [`Template`].
pub fn compile<S: 'static>(view: View<S>) -> Result<Template<S>, CompileError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("template_compile").entered();

    let mut ops = Vec::new();
    flatten(view, &mut ops, None, 0)?;

    let mut by_level: Vec<Vec<usize>> = Vec::new();
    for (index, op) in ops.iter().enumerate() {
        let depth = op.depth as usize;
        if by_level.len() <= depth {
            by_level.resize_with(depth + 1, Vec::new);
        }
        by_level[depth].push(index);
    }

    Ok(Template {
        ops,
        by_level,
        scratch: Scratch::default(),
    })
}

fn push<S>(ops: &mut Vec<Op<S>>, kind: OpKind<S>, parent: Option<usize>, depth: u16) -> usize {
    let index = ops.len();
    ops.push(Op {
        kind,
        parent: parent.unwrap_or(index),
        depth,
    });
    index
}

fn flatten<S: 'static>(
    view: View<S>,
    ops: &mut Vec<Op<S>>,
    parent: Option<usize>,
    depth: u16,
) -> Result<(), CompileError> {
    match view {
        View::Text { value, bold } => {
            push(ops, OpKind::Text { value, bold }, parent, depth);
        }
        View::Progress { value, width } => {
            push(ops, OpKind::Progress { value, width }, parent, depth);
        }
        View::Spans { value } => {
            push(ops, OpKind::Spans { value }, parent, depth);
        }
        View::Row { children, gap } => {
            let start = push(ops, OpKind::RowStart { gap }, parent, depth);
            for child in children {
                flatten(child, ops, Some(start), depth + 1)?;
            }
            push(ops, OpKind::RowEnd, Some(start), depth);
        }
        View::Column { children, gap } => {
            let start = push(ops, OpKind::ColStart { gap }, parent, depth);
            for child in children {
                flatten(child, ops, Some(start), depth + 1)?;
            }
            push(ops, OpKind::ColEnd, Some(start), depth);
        }
        View::When {
            cond,
            then,
            otherwise,
        } => {
            let body = compile(*then)?;
            push(ops, OpKind::If { cond, body }, parent, depth);
            if let Some(other) = otherwise {
                let body = compile(*other)?;
                push(ops, OpKind::Else { body }, parent, depth);
            }
        }
        View::Otherwise { body } => {
            // only a conditional with an open false path can take a
            // sibling else: a Cond carrying its own else branch or a
            // Switch carrying a default has already settled it
            let pairable = matches!(
                ops.last().map(|op| &op.kind),
                Some(
                    OpKind::If { .. }
                        | OpKind::Cond {
                            else_body: None,
                            ..
                        }
                        | OpKind::Switch {
                            default_body: None,
                            ..
                        }
                )
            );
            if !pairable {
                return Err(CompileError::ElseWithoutIf);
            }
            let body = compile(*body)?;
            push(ops, OpKind::Else { body }, parent, depth);
        }
        View::Condition(node) => {
            let then_body = compile(node.then_branch())?;
            let else_body = node.else_branch().map(compile).transpose()?;
            push(
                ops,
                OpKind::Cond {
                    node,
                    then_body,
                    else_body,
                },
                parent,
                depth,
            );
        }
        View::Switch(node) => {
            let case_views = node.cases();
            let default_view = node.default_case();
            if case_views.is_empty() && default_view.is_none() {
                return Err(CompileError::EmptySwitch);
            }
            let cases = case_views
                .into_iter()
                .map(compile)
                .collect::<Result<Vec<_>, _>>()?;
            let default_body = default_view.map(compile).transpose()?;
            push(
                ops,
                OpKind::Switch {
                    node,
                    cases,
                    default_body,
                },
                parent,
                depth,
            );
        }
        View::ForEach(body) => {
            let driver = body.0.compile_body()?;
            push(ops, OpKind::ForEach { driver }, parent, depth);
        }
        View::SelectList(body) => {
            let driver = body.0.compile_body()?;
            push(ops, OpKind::SelectList { driver }, parent, depth);
        }
        View::LayerView {
            layer,
            width,
            height,
        } => {
            let resolve: LayerResolveFn<S> = Rc::new(move |state| Some(layer(state)));
            push(
                ops,
                OpKind::LayerView {
                    resolve,
                    width,
                    height,
                },
                parent,
                depth,
            );
        }
    }
    Ok(())
}
