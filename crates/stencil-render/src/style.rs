#![forbid(unsafe_code)]

//! Colors, attribute flags, styles, and the glyph-width oracle.

use unicode_width::UnicodeWidthChar;

/// A terminal color.
///
/// The variant tag decides which SGR form styled read-back emits:
/// default (39/49), the classic 16-color palette, the 256-color palette,
/// or 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The terminal's default foreground or background.
    #[default]
    Default,
    /// 16-color palette index (0-7 normal, 8-15 bright).
    Ansi(u8),
    /// 256-color palette index.
    Indexed(u8),
    /// 24-bit RGB.
    Rgb(u8, u8, u8),
}

bitflags::bitflags! {
    /// Cell attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u8 {
        /// Bold / increased intensity.
        const BOLD      = 0b0000_0001;
        /// Dim / decreased intensity.
        const DIM       = 0b0000_0010;
        /// Italic text.
        const ITALIC    = 0b0000_0100;
        /// Underlined text.
        const UNDERLINE = 0b0000_1000;
        /// Reverse video (swap fg/bg).
        const INVERSE   = 0b0001_0000;
    }
}

/// Foreground, background, and attributes for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Attribute flags.
    pub attrs: AttrFlags,
}

impl Style {
    /// Default colors, no attributes.
    pub const DEFAULT: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        attrs: AttrFlags::empty(),
    };

    /// Create the default style.
    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Set the foreground color.
    #[inline]
    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = color;
        self
    }

    /// Set the background color.
    #[inline]
    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    /// Enable bold.
    #[inline]
    pub const fn bold(mut self) -> Self {
        self.attrs = self.attrs.union(AttrFlags::BOLD);
        self
    }

    /// Enable dim.
    #[inline]
    pub const fn dim(mut self) -> Self {
        self.attrs = self.attrs.union(AttrFlags::DIM);
        self
    }

    /// Enable italic.
    #[inline]
    pub const fn italic(mut self) -> Self {
        self.attrs = self.attrs.union(AttrFlags::ITALIC);
        self
    }

    /// Enable underline.
    #[inline]
    pub const fn underline(mut self) -> Self {
        self.attrs = self.attrs.union(AttrFlags::UNDERLINE);
        self
    }

    /// Enable reverse video.
    #[inline]
    pub const fn inverse(mut self) -> Self {
        self.attrs = self.attrs.union(AttrFlags::INVERSE);
        self
    }

    /// Check whether this is the all-default style.
    #[inline]
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Display width of a rune in terminal cells: 0, 1, or 2.
///
/// Control characters and the continuation marker are width 0. This is
/// the single width oracle the whole engine consults; it must agree with
/// the output terminal.
#[inline]
pub fn glyph_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Display width of a string: the sum of its rune widths.
#[inline]
pub fn display_width(s: &str) -> usize {
    s.chars().map(glyph_width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_has_default_colors_and_no_attrs() {
        let s = Style::default();
        assert_eq!(s.fg, Color::Default);
        assert_eq!(s.bg, Color::Default);
        assert!(s.attrs.is_empty());
        assert!(s.is_default());
    }

    #[test]
    fn builders_accumulate() {
        let s = Style::new()
            .fg(Color::Ansi(2))
            .bg(Color::Indexed(236))
            .bold()
            .underline();
        assert_eq!(s.fg, Color::Ansi(2));
        assert_eq!(s.bg, Color::Indexed(236));
        assert!(s.attrs.contains(AttrFlags::BOLD | AttrFlags::UNDERLINE));
        assert!(!s.attrs.contains(AttrFlags::ITALIC));
        assert!(!s.is_default());
    }

    #[test]
    fn glyph_width_ascii() {
        assert_eq!(glyph_width('a'), 1);
        assert_eq!(glyph_width(' '), 1);
        assert_eq!(glyph_width('~'), 1);
    }

    #[test]
    fn glyph_width_wide() {
        assert_eq!(glyph_width('日'), 2);
        assert_eq!(glyph_width('中'), 2);
    }

    #[test]
    fn glyph_width_zero() {
        assert_eq!(glyph_width('\0'), 0);
        assert_eq!(glyph_width('\u{0301}'), 0); // combining acute
    }

    #[test]
    fn display_width_mixed() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("a日b"), 4);
        assert_eq!(display_width(""), 0);
    }
}
