#![forbid(unsafe_code)]

//! ANSI SGR sequence generation for styled read-back.
//!
//! Pure string-building helpers: no state tracking, no I/O. The styled
//! line read-back in [`Buffer::line_styled`] emits one SGR per style
//! change using [`push_sgr`], and a reset at end of line.
//!
//! [`Buffer::line_styled`]: crate::buffer::Buffer::line_styled
//!
//! # Sequence forms
//!
//! | Color tag | Foreground | Background |
//! |-----------|------------|------------|
//! | default | `39` | `49` |
//! | palette 0-7 | `30+i` | `40+i` |
//! | palette 8-15 | `90+i-8` | `100+i-8` |
//! | 256-palette | `38;5;i` | `48;5;i` |
//! | RGB | `38;2;r;g;b` | `48;2;r;g;b` |

use std::fmt::Write;

use crate::style::{AttrFlags, Color, Style};

/// SGR reset: `CSI 0 m`.
pub const SGR_RESET: &str = "\x1b[0m";

/// Append the full SGR sequence for a style: `ESC[0;attrs;fg;bg m`.
///
/// The sequence always begins with `0` (reset) so emitted styles never
/// depend on what came before them on the line.
pub fn push_sgr(out: &mut String, style: Style) {
    out.push_str("\x1b[0");
    for (flag, code) in [
        (AttrFlags::BOLD, 1),
        (AttrFlags::DIM, 2),
        (AttrFlags::ITALIC, 3),
        (AttrFlags::UNDERLINE, 4),
        (AttrFlags::INVERSE, 7),
    ] {
        if style.attrs.contains(flag) {
            let _ = write!(out, ";{code}");
        }
    }
    push_color(out, style.fg, false);
    push_color(out, style.bg, true);
    out.push('m');
}

fn push_color(out: &mut String, color: Color, background: bool) {
    match color {
        Color::Default => {
            let _ = write!(out, ";{}", if background { 49 } else { 39 });
        }
        Color::Ansi(i) => {
            let base = match (background, i < 8) {
                (false, true) => 30 + i as u16,
                (false, false) => 90 + i as u16 - 8,
                (true, true) => 40 + i as u16,
                (true, false) => 100 + i as u16 - 8,
            };
            let _ = write!(out, ";{base}");
        }
        Color::Indexed(i) => {
            let _ = write!(out, ";{};5;{i}", if background { 48 } else { 38 });
        }
        Color::Rgb(r, g, b) => {
            let _ = write!(out, ";{};2;{r};{g};{b}", if background { 48 } else { 38 });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sgr(style: Style) -> String {
        let mut out = String::new();
        push_sgr(&mut out, style);
        out
    }

    #[test]
    fn default_style_emits_default_colors() {
        assert_eq!(sgr(Style::DEFAULT), "\x1b[0;39;49m");
    }

    #[test]
    fn attrs_in_canonical_order() {
        let style = Style::new().bold().italic().underline();
        assert_eq!(sgr(style), "\x1b[0;1;3;4;39;49m");
    }

    #[test]
    fn inverse_and_dim() {
        assert_eq!(sgr(Style::new().dim().inverse()), "\x1b[0;2;7;39;49m");
    }

    #[test]
    fn palette_16_normal_and_bright() {
        assert_eq!(sgr(Style::new().fg(Color::Ansi(1))), "\x1b[0;31;49m");
        assert_eq!(sgr(Style::new().fg(Color::Ansi(9))), "\x1b[0;91;49m");
        assert_eq!(sgr(Style::new().bg(Color::Ansi(4))), "\x1b[0;39;44m");
        assert_eq!(sgr(Style::new().bg(Color::Ansi(12))), "\x1b[0;39;104m");
    }

    #[test]
    fn palette_256() {
        assert_eq!(
            sgr(Style::new().fg(Color::Indexed(196)).bg(Color::Indexed(232))),
            "\x1b[0;38;5;196;48;5;232m"
        );
    }

    #[test]
    fn rgb() {
        assert_eq!(
            sgr(Style::new().fg(Color::Rgb(255, 128, 0))),
            "\x1b[0;38;2;255;128;0;49m"
        );
        assert_eq!(
            sgr(Style::new().bg(Color::Rgb(0, 0, 0))),
            "\x1b[0;39;48;2;0;0;0m"
        );
    }

    #[test]
    fn full_combination() {
        let style = Style::new()
            .bold()
            .fg(Color::Ansi(2))
            .bg(Color::Rgb(10, 20, 30));
        assert_eq!(sgr(style), "\x1b[0;1;32;48;2;10;20;30m");
    }

    #[test]
    fn reset_constant() {
        assert_eq!(SGR_RESET, "\x1b[0m");
    }
}
