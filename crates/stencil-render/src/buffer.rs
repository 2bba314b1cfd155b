#![forbid(unsafe_code)]

//! Buffer grid storage.
//!
//! The `Buffer` is a 2D grid of [`Cell`]s laid out in row-major order
//! (`index = y * width + x`) with row-level dirty tracking, so a diffing
//! consumer can skip untouched rows and a lazy clear can skip rows that
//! were never written.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`, and neither dimension changes
//!    outside [`Buffer::resize`].
//! 2. Out-of-bounds coordinates in public writes are silently ignored.
//! 3. `dirty_max_y` is the greatest row touched by any write since the
//!    last [`Buffer::clear_dirty`]; that call resets it to 0.
//! 4. When [`Buffer::set`] places a box-drawing glyph over another, the
//!    stored rune is the glyph whose edge set is the union of both.

use crate::ansi::{SGR_RESET, push_sgr};
use crate::cell::{CONTINUATION, Cell, Span};
use crate::style::{Color, Style, display_width, glyph_width};

/// Background used for the unfilled portion of progress bars.
pub const BAR_EMPTY_BG: Color = Color::Rgb(58, 58, 58);

/// Partial horizontal blocks indexed by filled eighths (0..=8).
const PARTIAL_BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Height-stepped blocks for sparklines, lowest to tallest.
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

const EDGE_TOP: u8 = 0b0001;
const EDGE_RIGHT: u8 = 0b0010;
const EDGE_BOTTOM: u8 = 0b0100;
const EDGE_LEFT: u8 = 0b1000;

/// Edge set of a canonical thin box-drawing glyph; 0 for everything else.
const fn edge_mask(rune: char) -> u8 {
    match rune {
        '─' => EDGE_LEFT | EDGE_RIGHT,
        '│' => EDGE_TOP | EDGE_BOTTOM,
        '┌' => EDGE_RIGHT | EDGE_BOTTOM,
        '┐' => EDGE_LEFT | EDGE_BOTTOM,
        '└' => EDGE_TOP | EDGE_RIGHT,
        '┘' => EDGE_TOP | EDGE_LEFT,
        '├' => EDGE_TOP | EDGE_BOTTOM | EDGE_RIGHT,
        '┤' => EDGE_TOP | EDGE_BOTTOM | EDGE_LEFT,
        '┬' => EDGE_LEFT | EDGE_RIGHT | EDGE_BOTTOM,
        '┴' => EDGE_LEFT | EDGE_RIGHT | EDGE_TOP,
        '┼' => EDGE_TOP | EDGE_RIGHT | EDGE_BOTTOM | EDGE_LEFT,
        _ => 0,
    }
}

/// Canonical glyph for each edge mask; `'\0'` marks masks with no glyph.
const MASK_GLYPHS: [char; 16] = [
    '\0', '\0', '\0', '└', '\0', '│', '┌', '├', '\0', '┘', '─', '┴', '┐', '┤', '┬', '┼',
];

/// Union-merge two box glyphs; `None` when either is not a border glyph
/// or the union has no canonical form (the incoming rune then wins).
fn merge_border(existing: char, incoming: char) -> Option<char> {
    let (a, b) = (edge_mask(existing), edge_mask(incoming));
    if a == 0 || b == 0 {
        return None;
    }
    match MASK_GLYPHS[(a | b) as usize] {
        '\0' => None,
        glyph => Some(glyph),
    }
}

/// A 2D grid of terminal cells with row-level dirty tracking.
///
/// # Example
///
/// ```
/// use stencil_render::buffer::Buffer;
/// use stencil_render::style::Style;
///
/// let mut buf = Buffer::new(20, 4);
/// buf.write_str(0, 0, "hello", Style::DEFAULT);
/// assert_eq!(buf.line(0), "hello");
/// assert!(buf.row_dirty(0));
/// ```
#[derive(Debug, Clone)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    dirty_rows: Vec<bool>,
    all_dirty: bool,
    dirty_max_y: u16,
}

impl Buffer {
    /// Create a buffer with every cell set to [`Cell::EMPTY`].
    ///
    /// # Panics
    ///
    /// Panics if width or height is 0.
    pub fn new(width: u16, height: u16) -> Self {
        assert!(width > 0, "buffer width must be > 0");
        assert!(height > 0, "buffer height must be > 0");
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width as usize * height as usize],
            dirty_rows: vec![false; height as usize],
            all_dirty: false,
            dirty_max_y: 0,
        }
    }

    /// Buffer width in cells.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in cells.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Raw access to the cell slice, for diffing consumers and tests.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    #[inline]
    fn mark_row(&mut self, y: u16) {
        self.dirty_rows[y as usize] = true;
        if y > self.dirty_max_y {
            self.dirty_max_y = y;
        }
    }

    /// Cell at (x, y); [`Cell::EMPTY`] when out of bounds.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Cell {
        self.index(x, y).map_or(Cell::EMPTY, |i| self.cells[i])
    }

    /// Set the cell at (x, y), merging overlapping box-drawing glyphs.
    ///
    /// No-op when out of bounds. When both the existing and the incoming
    /// rune are canonical box glyphs, the stored rune is the one whose
    /// edge set is the union of both; the incoming style wins either way.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        let stored = match merge_border(self.cells[idx].rune, cell.rune) {
            Some(rune) => Cell::new(rune, cell.style),
            None => cell,
        };
        self.cells[idx] = stored;
        self.mark_row(y);
    }

    /// Set the cell at (x, y) without border merging.
    ///
    /// The hot path for text and progress content. No-op out of bounds.
    #[inline]
    pub fn set_fast(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = cell;
            self.mark_row(y);
        }
    }

    // ========== String writes ==========

    /// Write a string left-to-right with a single style, clipped to the
    /// buffer edge. Wide glyphs occupy two cells, the second holding a
    /// continuation marker with the same style.
    pub fn write_str(&mut self, x: u16, y: u16, s: &str, style: Style) {
        self.write_run(x, y, s, style, self.width);
    }

    /// Like [`Buffer::write_str`] but clipped to `x + max_w`.
    pub fn write_str_clipped(&mut self, x: u16, y: u16, s: &str, style: Style, max_w: u16) {
        self.write_run(x, y, s, style, x.saturating_add(max_w));
    }

    /// Write a string and fill the rest of a `w`-column field with styled
    /// spaces, so callers with stable UI structure can skip clearing.
    pub fn write_str_padded(&mut self, x: u16, y: u16, s: &str, style: Style, w: u16) {
        let limit = x.saturating_add(w);
        let end = self.write_run(x, y, s, style, limit);
        if y >= self.height {
            return;
        }
        let pad = Cell::new(' ', style);
        for cx in end..limit.min(self.width) {
            let idx = y as usize * self.width as usize + cx as usize;
            self.cells[idx] = pad;
        }
        if end < limit.min(self.width) {
            self.mark_row(y);
        }
    }

    /// Fast string write: one line-level bounds check, no border merge,
    /// one cell per rune. Callers promise ASCII-only text; wide-glyph-safe
    /// content goes through [`Buffer::write_spans`].
    pub fn write_str_fast(&mut self, x: u16, y: u16, s: &str, style: Style, max_w: u16) {
        if y >= self.height || x >= self.width {
            return;
        }
        let limit = x.saturating_add(max_w).min(self.width) as usize;
        let base = y as usize * self.width as usize;
        let mut cx = x as usize;
        for rune in s.chars() {
            if cx >= limit {
                break;
            }
            self.cells[base + cx] = Cell::new(rune, style);
            cx += 1;
        }
        if cx > x as usize {
            self.mark_row(y);
        }
    }

    /// Write styled runs sequentially, glyph-width aware.
    ///
    /// Width-2 glyphs occupy two cells (the second a continuation cell
    /// with the span's style); width-0 runes are promoted to one cell for
    /// positioning. Stops at `x + max_w` or the buffer edge.
    pub fn write_spans(&mut self, x: u16, y: u16, spans: &[Span], max_w: u16) {
        let limit = x.saturating_add(max_w);
        let mut cx = x;
        for span in spans {
            cx = self.write_run(cx, y, &span.text, span.style, limit);
        }
    }

    /// Glyph-width-aware run writer shared by the string paths.
    ///
    /// Returns the x position after the last written rune. A wide glyph
    /// that would cross `limit` stops the run.
    fn write_run(&mut self, x: u16, y: u16, text: &str, style: Style, limit: u16) -> u16 {
        if y >= self.height {
            return x;
        }
        let limit = limit.min(self.width);
        let base = y as usize * self.width as usize;
        let mut cx = x;
        for rune in text.chars() {
            let w = glyph_width(rune).max(1) as u16;
            if cx >= limit || cx as u32 + w as u32 > limit as u32 {
                break;
            }
            self.cells[base + cx as usize] = Cell::new(rune, style);
            if w == 2 {
                self.cells[base + cx as usize + 1] = Cell::new(CONTINUATION, style);
            }
            cx += w;
        }
        if cx > x {
            self.mark_row(y);
        }
        cx
    }

    // ========== Widget-shaped writes ==========

    /// Draw a progress bar `w` cells wide with eighth-cell precision.
    ///
    /// The ratio is clamped to `[0, 1]`. Completed cells get a full
    /// block, the frontier cell a partial block from the eighths table,
    /// and empty cells a styled space over [`BAR_EMPTY_BG`].
    pub fn write_progress_bar(&mut self, x: u16, y: u16, w: u16, ratio: f64, style: Style) {
        if y >= self.height || w == 0 {
            return;
        }
        let ratio = if ratio.is_nan() {
            0.0
        } else {
            ratio.clamp(0.0, 1.0)
        };
        let eighths = (ratio * w as f64 * 8.0).round() as u32;
        let full = eighths / 8;
        let rem = (eighths % 8) as usize;
        let empty_style = Style {
            bg: BAR_EMPTY_BG,
            ..style
        };
        for i in 0..w {
            let cell = if (i as u32) < full {
                Cell::new('█', style)
            } else if i as u32 == full && rem > 0 {
                Cell::new(PARTIAL_BLOCKS[rem], empty_style)
            } else {
                Cell::new(' ', empty_style)
            };
            self.set_fast(x.saturating_add(i), y, cell);
        }
    }

    /// Write `label`, a run of at least one `fill` rune, then `value`
    /// right-aligned, within a `w`-column field. `'.'` is the
    /// conventional fill.
    pub fn write_leader(
        &mut self,
        x: u16,
        y: u16,
        label: &str,
        value: &str,
        w: u16,
        fill: char,
        style: Style,
    ) {
        if w == 0 || y >= self.height {
            return;
        }
        let vw = display_width(value).min(w as usize) as u16;
        let label_budget = w.saturating_sub(vw + 1);
        let label_end = self.write_run(x, y, label, style, x.saturating_add(label_budget));
        let value_x = x.saturating_add(w - vw);
        let fill_cell = Cell::new(fill, style);
        for cx in label_end..value_x {
            self.set_fast(cx, y, fill_cell);
        }
        self.write_run(value_x, y, value, style, x.saturating_add(w));
    }

    /// Draw a sparkline by sampling `values` into `w` cells of 8-level
    /// block glyphs. When `min` and `max` are both 0 the bounds are
    /// derived from the data; normalization clamps out-of-range values.
    pub fn write_sparkline(
        &mut self,
        x: u16,
        y: u16,
        values: &[f64],
        w: u16,
        min: f64,
        max: f64,
        style: Style,
    ) {
        if values.is_empty() || w == 0 || y >= self.height {
            return;
        }
        let (lo, hi) = if min == 0.0 && max == 0.0 {
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (lo, hi)
        } else {
            (min, max)
        };
        let span = hi - lo;
        for i in 0..w as usize {
            let v = values[i * values.len() / w as usize];
            let t = if span > 0.0 {
                ((v - lo) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let level = (t * 7.0).round() as usize;
            self.set_fast(
                x.saturating_add(i as u16),
                y,
                Cell::new(SPARK_LEVELS[level], style),
            );
        }
    }

    // ========== Rect operations ==========

    /// Fill a rectangle with the given cell. Box-drawing runes take the
    /// merging path; everything else overwrites directly.
    pub fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, cell: Cell) {
        let merging = edge_mask(cell.rune) != 0;
        for dy in 0..h {
            for dx in 0..w {
                let (cx, cy) = (x.saturating_add(dx), y.saturating_add(dy));
                if merging {
                    self.set(cx, cy, cell);
                } else {
                    self.set_fast(cx, cy, cell);
                }
            }
        }
    }

    /// Draw a thin single-line border: four corners, two horizontal and
    /// two vertical edges. Ignored when `w < 2` or `h < 2`. Overlapping
    /// borders merge at the junctions.
    pub fn draw_border(&mut self, x: u16, y: u16, w: u16, h: u16, style: Style) {
        if w < 2 || h < 2 {
            return;
        }
        let right = x.saturating_add(w - 1);
        let bottom = y.saturating_add(h - 1);
        for cx in x + 1..right {
            self.set(cx, y, Cell::new('─', style));
            self.set(cx, bottom, Cell::new('─', style));
        }
        for cy in y + 1..bottom {
            self.set(x, cy, Cell::new('│', style));
            self.set(right, cy, Cell::new('│', style));
        }
        self.set(x, y, Cell::new('┌', style));
        self.set(right, y, Cell::new('┐', style));
        self.set(x, bottom, Cell::new('└', style));
        self.set(right, bottom, Cell::new('┘', style));
    }

    /// Row-by-row copy from `src` with clipping on both sides.
    ///
    /// Copies nothing when the clipped extent is empty; every written
    /// row is marked dirty.
    pub fn blit(&mut self, src: &Buffer, sx: u16, sy: u16, dx: u16, dy: u16, w: u16, h: u16) {
        if sx >= src.width || sy >= src.height || dx >= self.width || dy >= self.height {
            return;
        }
        let w = w.min(src.width - sx).min(self.width - dx) as usize;
        let h = h.min(src.height - sy).min(self.height - dy);
        if w == 0 {
            return;
        }
        for row in 0..h {
            let s0 = (sy + row) as usize * src.width as usize + sx as usize;
            let d0 = (dy + row) as usize * self.width as usize + dx as usize;
            self.cells[d0..d0 + w].copy_from_slice(&src.cells[s0..s0 + w]);
            self.mark_row(dy + row);
        }
    }

    /// Whole-buffer copy; no-op unless dimensions match exactly.
    pub fn copy_from(&mut self, src: &Buffer) {
        if self.width != src.width || self.height != src.height {
            return;
        }
        self.cells.copy_from_slice(&src.cells);
        self.all_dirty = true;
        self.dirty_rows.fill(true);
        self.dirty_max_y = self.height - 1;
    }

    /// Reallocate to new dimensions, preserving the overlapping
    /// rectangle. All rows become dirty. Same-size resize is a no-op.
    pub fn resize(&mut self, width: u16, height: u16) {
        assert!(width > 0, "buffer width must be > 0");
        assert!(height > 0, "buffer height must be > 0");
        if width == self.width && height == self.height {
            return;
        }
        let mut cells = vec![Cell::EMPTY; width as usize * height as usize];
        let copy_w = self.width.min(width) as usize;
        for y in 0..self.height.min(height) as usize {
            let s0 = y * self.width as usize;
            let d0 = y * width as usize;
            cells[d0..d0 + copy_w].copy_from_slice(&self.cells[s0..s0 + copy_w]);
        }
        self.cells = cells;
        self.width = width;
        self.height = height;
        self.dirty_rows = vec![true; height as usize];
        self.all_dirty = true;
        self.dirty_max_y = height - 1;
    }

    // ========== Clearing and dirty tracking ==========

    /// Restore every cell to [`Cell::EMPTY`] and mark all rows dirty.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
        self.all_dirty = true;
        self.dirty_rows.fill(true);
        self.dirty_max_y = self.height - 1;
    }

    /// Clear only rows `0..=dirty_max_y` (the rows any write could have
    /// touched since the last clear), re-mark them dirty, and reset
    /// `dirty_max_y`. The lazy-clear path used on pool swaps.
    pub fn clear_dirty(&mut self) {
        let end_row = self.dirty_max_y.min(self.height - 1) as usize;
        let end = (end_row + 1) * self.width as usize;
        self.cells[..end].fill(Cell::EMPTY);
        for row in &mut self.dirty_rows[..=end_row] {
            *row = true;
        }
        self.dirty_max_y = 0;
    }

    /// Clear the dirty bitset without touching cells. Called after a
    /// consumer has emitted a frame.
    pub fn clear_dirty_flags(&mut self) {
        self.dirty_rows.fill(false);
        self.all_dirty = false;
    }

    /// Whether row `y` has been written since the last flag clear.
    #[inline]
    pub fn row_dirty(&self, y: u16) -> bool {
        self.all_dirty || self.dirty_rows.get(y as usize).copied().unwrap_or(false)
    }

    /// Greatest row index touched since the last [`Buffer::clear_dirty`].
    #[inline]
    pub const fn dirty_max_y(&self) -> u16 {
        self.dirty_max_y
    }

    /// Number of rows from the top through the last non-empty row.
    pub fn content_height(&self) -> u16 {
        for y in (0..self.height).rev() {
            let base = y as usize * self.width as usize;
            if self.cells[base..base + self.width as usize]
                .iter()
                .any(|c| !c.is_empty())
            {
                return y + 1;
            }
        }
        0
    }

    // ========== Read-back ==========

    /// Reconstruct row `y` as a string with trailing spaces trimmed.
    /// Continuation cells render as spaces.
    pub fn line(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let base = y as usize * self.width as usize;
        let mut out = String::with_capacity(self.width as usize);
        for cell in &self.cells[base..base + self.width as usize] {
            out.push(if cell.is_continuation() {
                ' '
            } else {
                cell.rune
            });
        }
        out.truncate(out.trim_end_matches(' ').len());
        out
    }

    /// Reconstruct row `y` with SGR escapes emitted on every style
    /// change and a reset at end of line when the last style was
    /// non-default.
    pub fn line_styled(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let base = y as usize * self.width as usize;
        let row = &self.cells[base..base + self.width as usize];
        let end = row
            .iter()
            .rposition(|c| !c.is_empty())
            .map_or(0, |i| i + 1);
        let mut out = String::new();
        let mut current = Style::DEFAULT;
        for cell in &row[..end] {
            if cell.style != current {
                push_sgr(&mut out, cell.style);
                current = cell.style;
            }
            out.push(if cell.is_continuation() {
                ' '
            } else {
                cell.rune
            });
        }
        if current != Style::DEFAULT {
            out.push_str(SGR_RESET);
        }
        out
    }

    /// Full contents with trailing empty lines removed.
    pub fn to_string_trimmed(&self) -> String {
        let mut lines: Vec<String> = (0..self.height).map(|y| self.line(y)).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }
}

impl std::fmt::Display for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..self.height {
            if y > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&self.line(y))?;
        }
        Ok(())
    }
}
