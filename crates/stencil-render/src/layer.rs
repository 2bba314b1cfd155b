#![forbid(unsafe_code)]

//! Scrollable off-screen layers.
//!
//! A `Layer` owns an optional content buffer that is usually taller than
//! the window it is shown through. The executor composites the visible
//! window into a host buffer with [`Layer::blit_into`]; scroll state
//! lives on the layer and is clamped on every mutation, so scroll
//! operations never panic.

use std::cell::Cell as StdCell;

use crate::buffer::Buffer;
use crate::style::Style;

/// Cursor position inside a layer's content, in content space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerCursor {
    /// Column in content space.
    pub x: u16,
    /// Row in content space.
    pub y: u16,
    /// Style the host should render the caret with.
    pub style: Style,
}

/// A scrollable sub-buffer with a viewport and an optional cursor.
///
/// # Invariants
///
/// - `0 <= scroll_y <= max_scroll()` at all observable times.
/// - A layer without content blits nothing; the host background stays
///   visible.
#[derive(Debug)]
pub struct Layer {
    content: Option<Buffer>,
    scroll_y: u16,
    view_w: u16,
    view_h: u16,
    /// Host-buffer position of the last blit, recorded so
    /// [`Layer::screen_cursor`] follows the layer wherever the executor
    /// placed it. Interior-mutable because blits happen during a shared
    /// walk of caller state.
    screen_pos: StdCell<(u16, u16)>,
    cursor: Option<LayerCursor>,
}

impl Layer {
    /// Create a layer with the given viewport and no content.
    pub fn new(view_w: u16, view_h: u16) -> Self {
        Self {
            content: None,
            scroll_y: 0,
            view_w,
            view_h,
            screen_pos: StdCell::new((0, 0)),
            cursor: None,
        }
    }

    /// Create a layer owning a content buffer.
    pub fn with_content(content: Buffer, view_w: u16, view_h: u16) -> Self {
        let mut layer = Self::new(view_w, view_h);
        layer.set_content(content);
        layer
    }

    /// Replace the content buffer. Scroll is re-clamped.
    pub fn set_content(&mut self, content: Buffer) {
        self.content = Some(content);
        self.clamp_scroll();
    }

    /// Drop the content buffer; subsequent blits are no-ops.
    pub fn clear_content(&mut self) {
        self.content = None;
        self.clamp_scroll();
    }

    /// The content buffer, if any.
    #[inline]
    pub fn content(&self) -> Option<&Buffer> {
        self.content.as_ref()
    }

    /// Mutable access to the content buffer, if any.
    #[inline]
    pub fn content_mut(&mut self) -> Option<&mut Buffer> {
        self.content.as_mut()
    }

    /// Viewport width in cells.
    #[inline]
    pub const fn view_w(&self) -> u16 {
        self.view_w
    }

    /// Viewport height in cells.
    #[inline]
    pub const fn view_h(&self) -> u16 {
        self.view_h
    }

    /// Resize the viewport. Scroll is re-clamped.
    pub fn set_viewport(&mut self, view_w: u16, view_h: u16) {
        self.view_w = view_w;
        self.view_h = view_h;
        self.clamp_scroll();
    }

    /// Current scroll offset (first visible content row).
    #[inline]
    pub const fn scroll_y(&self) -> u16 {
        self.scroll_y
    }

    /// Greatest valid scroll offset: `max(0, content_h - view_h)`.
    pub fn max_scroll(&self) -> u16 {
        self.content
            .as_ref()
            .map_or(0, |c| c.height().saturating_sub(self.view_h))
    }

    fn clamp_scroll(&mut self) {
        self.scroll_y = self.scroll_y.min(self.max_scroll());
    }

    /// Scroll to an absolute offset, clamped.
    pub fn scroll_to(&mut self, y: u16) {
        self.scroll_y = y.min(self.max_scroll());
    }

    /// Scroll up by `n` rows.
    pub fn scroll_up(&mut self, n: u16) {
        self.scroll_y = self.scroll_y.saturating_sub(n);
    }

    /// Scroll down by `n` rows, clamped.
    pub fn scroll_down(&mut self, n: u16) {
        self.scroll_to(self.scroll_y.saturating_add(n));
    }

    /// Scroll up one viewport height.
    pub fn page_up(&mut self) {
        self.scroll_up(self.view_h);
    }

    /// Scroll down one viewport height.
    pub fn page_down(&mut self) {
        self.scroll_down(self.view_h);
    }

    /// Scroll up half a viewport height.
    pub fn half_page_up(&mut self) {
        self.scroll_up(self.view_h / 2);
    }

    /// Scroll down half a viewport height.
    pub fn half_page_down(&mut self) {
        self.scroll_down(self.view_h / 2);
    }

    /// Jump to the top.
    pub fn scroll_to_top(&mut self) {
        self.scroll_y = 0;
    }

    /// Jump so the last content row is visible.
    pub fn scroll_to_end(&mut self) {
        self.scroll_y = self.max_scroll();
    }

    /// Set or clear the content-space cursor.
    pub fn set_cursor(&mut self, cursor: Option<LayerCursor>) {
        self.cursor = cursor;
    }

    /// The content-space cursor, if any.
    #[inline]
    pub fn cursor(&self) -> Option<LayerCursor> {
        self.cursor
    }

    /// Translate the cursor to host-buffer space.
    ///
    /// Returns `None` when there is no cursor or its row is scrolled out
    /// of the viewport.
    pub fn screen_cursor(&self) -> Option<(u16, u16)> {
        let cursor = self.cursor?;
        if cursor.y < self.scroll_y || cursor.y >= self.scroll_y.saturating_add(self.view_h) {
            return None;
        }
        let (sx, sy) = self.screen_pos.get();
        Some((
            sx.saturating_add(cursor.x),
            sy.saturating_add(cursor.y - self.scroll_y),
        ))
    }

    /// Composite the visible window into `dst` at `(x, y)`, cropped to
    /// `w` columns and `h` rows.
    ///
    /// Records the layer's host position so cursor translation follows.
    /// No cells are modified when the layer has no content.
    pub fn blit_into(&self, dst: &mut Buffer, x: u16, y: u16, w: u16, h: u16) {
        self.screen_pos.set((x, y));
        let Some(content) = &self.content else {
            return;
        };
        dst.blit(content, 0, self.scroll_y, x, y, w, h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Style;

    fn content(lines: &[&str]) -> Buffer {
        let mut buf = Buffer::new(8, lines.len() as u16);
        for (y, line) in lines.iter().enumerate() {
            buf.write_str(0, y as u16, line, Style::DEFAULT);
        }
        buf
    }

    #[test]
    fn scroll_clamps_to_content_height() {
        let mut layer = Layer::with_content(content(&["a", "b", "c", "d", "e"]), 8, 3);
        assert_eq!(layer.max_scroll(), 2);
        layer.scroll_down(10);
        assert_eq!(layer.scroll_y(), 2);
        layer.scroll_up(1);
        assert_eq!(layer.scroll_y(), 1);
        layer.scroll_up(10);
        assert_eq!(layer.scroll_y(), 0);
        layer.scroll_to(100);
        assert_eq!(layer.scroll_y(), 2);
    }

    #[test]
    fn scroll_ops_without_content_never_panic() {
        let mut layer = Layer::new(8, 3);
        layer.scroll_down(5);
        layer.page_down();
        layer.scroll_to_end();
        assert_eq!(layer.scroll_y(), 0);
        assert_eq!(layer.max_scroll(), 0);
    }

    #[test]
    fn page_and_half_page_steps() {
        let mut layer = Layer::with_content(content(&["1"; 20]), 8, 4);
        layer.page_down();
        assert_eq!(layer.scroll_y(), 4);
        layer.half_page_down();
        assert_eq!(layer.scroll_y(), 6);
        layer.half_page_up();
        assert_eq!(layer.scroll_y(), 4);
        layer.page_up();
        assert_eq!(layer.scroll_y(), 0);
        layer.scroll_to_end();
        assert_eq!(layer.scroll_y(), 16);
        layer.scroll_to_top();
        assert_eq!(layer.scroll_y(), 0);
    }

    #[test]
    fn viewport_shrink_reclamps() {
        let mut layer = Layer::with_content(content(&["x"; 6]), 8, 6);
        assert_eq!(layer.max_scroll(), 0);
        layer.set_viewport(8, 2);
        layer.scroll_to_end();
        assert_eq!(layer.scroll_y(), 4);
        layer.set_viewport(8, 6);
        assert_eq!(layer.scroll_y(), 0);
    }

    #[test]
    fn blit_shows_scrolled_window() {
        let layer = {
            let mut l = Layer::with_content(content(&["one", "two", "three", "four", "five"]), 8, 3);
            l.scroll_to(2);
            l
        };
        let mut host = Buffer::new(10, 5);
        layer.blit_into(&mut host, 1, 1, 8, 3);
        assert_eq!(host.line(1), " three");
        assert_eq!(host.line(2), " four");
        assert_eq!(host.line(3), " five");
    }

    #[test]
    fn blit_without_content_is_noop() {
        let layer = Layer::new(4, 2);
        let mut host = Buffer::new(6, 4);
        host.write_str(0, 0, "keep", Style::DEFAULT);
        layer.blit_into(&mut host, 0, 0, 4, 2);
        assert_eq!(host.line(0), "keep");
    }

    #[test]
    fn titled_bordered_box_around_layer() {
        // border rows 0 and 4, three layer rows between, title on the
        // top border
        let mut host = Buffer::new(12, 6);
        host.draw_border(0, 0, 12, 5, Style::DEFAULT);
        host.write_str(2, 0, "Log", Style::DEFAULT);

        let layer = Layer::with_content(
            content(&["alpha", "bravo", "charlie", "delta", "echo"]),
            10,
            3,
        );
        layer.blit_into(&mut host, 1, 1, 10, 3);

        let top = host.line(0);
        assert!(top.starts_with('┌'), "got {top:?}");
        assert!(top.contains("Log"), "got {top:?}");
        assert!(host.line(1).starts_with("│alpha"));
        assert!(host.line(3).starts_with("│charlie"));
        let bottom = host.line(4);
        assert!(bottom.starts_with('└') && bottom.contains('─'), "got {bottom:?}");
    }

    #[test]
    fn screen_cursor_translates_when_visible() {
        let mut layer = Layer::with_content(content(&["a"; 10]), 8, 3);
        layer.set_cursor(Some(LayerCursor {
            x: 2,
            y: 5,
            style: Style::DEFAULT,
        }));
        let mut host = Buffer::new(20, 10);

        // cursor row 5 not in window [0, 3)
        layer.blit_into(&mut host, 4, 2, 8, 3);
        assert_eq!(layer.screen_cursor(), None);

        layer.scroll_to(4);
        layer.blit_into(&mut host, 4, 2, 8, 3);
        // row 5 is the second visible row; screen = (4 + 2, 2 + 1)
        assert_eq!(layer.screen_cursor(), Some((6, 3)));

        layer.scroll_to(6);
        assert_eq!(layer.screen_cursor(), None);
    }

    mod property {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scroll_always_in_range(
                content_h in 1u16..40,
                view_h in 1u16..20,
                ops in proptest::collection::vec(0u8..7, 0..25),
                arg in 0u16..50,
            ) {
                let mut layer = Layer::with_content(
                    Buffer::new(4, content_h), 4, view_h,
                );
                for op in ops {
                    match op {
                        0 => layer.scroll_to(arg),
                        1 => layer.scroll_up(arg),
                        2 => layer.scroll_down(arg),
                        3 => layer.page_up(),
                        4 => layer.page_down(),
                        5 => layer.half_page_down(),
                        _ => layer.scroll_to_end(),
                    }
                    prop_assert!(layer.scroll_y() <= layer.max_scroll());
                }
            }
        }
    }
}
