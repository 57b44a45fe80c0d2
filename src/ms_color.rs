// Board palette with terminal-independent colors
// ANSI colors are pinned to the Windows Terminal "Campbell" scheme when the
// terminal can show more than 16 colors, so the board looks alike everywhere.

use ratatui::style::Color;
use term_color_support::ColorSupport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    TrueColor,
    Indexed256,
    Basic,
}

impl Depth {
    pub fn detect() -> Depth {
        let support = ColorSupport::stdout();
        if support.has_16m {
            Depth::TrueColor
        } else if support.has_256 {
            Depth::Indexed256
        } else {
            Depth::Basic
        }
    }
}

// (ANSI color, Campbell RGB, nearest stable 256-color index)
const CAMPBELL: [(Color, (u8, u8, u8), u8); 16] = [
    (Color::Black, (12, 12, 12), 232),
    (Color::Red, (197, 15, 31), 160),
    (Color::Green, (19, 161, 14), 28),
    (Color::Yellow, (193, 156, 0), 178),
    (Color::Blue, (0, 55, 218), 20),
    (Color::Magenta, (136, 23, 152), 90),
    (Color::Cyan, (58, 150, 221), 38),
    (Color::Gray, (204, 204, 204), 250),
    (Color::DarkGray, (118, 118, 118), 243),
    (Color::LightRed, (231, 72, 86), 203),
    (Color::LightGreen, (22, 198, 12), 46),
    (Color::LightYellow, (249, 241, 165), 229),
    (Color::LightBlue, (59, 120, 255), 63),
    (Color::LightMagenta, (180, 0, 158), 163),
    (Color::LightCyan, (97, 214, 214), 116),
    (Color::White, (242, 242, 242), 255),
];

/// Map an ANSI color for the given depth; other colors pass through.
pub fn pin(color: Color, depth: Depth) -> Color {
    let Some((_, (r, g, b), idx)) = CAMPBELL.iter().find(|(c, _, _)| *c == color) else {
        return color;
    };
    match depth {
        Depth::TrueColor => Color::Rgb(*r, *g, *b),
        Depth::Indexed256 => Color::Indexed(*idx),
        Depth::Basic => color,
    }
}

/// Colors used by the board and the chrome around it
#[derive(Debug, Clone)]
pub struct Palette {
    pub covered: Color,
    pub board_bg: Color,
    pub cursor_bg: Color,
    pub flag: Color,
    pub bomb: Color,
    pub bomb_bg: Color,
    /// Colors for adjacent-bomb counts 1..=8
    pub numbers: [Color; 8],
    pub menu_key: Color,
    pub indicator: Color,
    pub error: Color,
}

impl Palette {
    pub fn new(depth: Depth) -> Palette {
        let p = |c| pin(c, depth);
        Palette {
            covered: p(Color::Gray),
            board_bg: p(Color::DarkGray),
            cursor_bg: p(Color::LightBlue),
            flag: p(Color::Red),
            bomb: p(Color::Black),
            bomb_bg: p(Color::LightRed),
            numbers: [
                p(Color::Blue),
                p(Color::Green),
                p(Color::Red),
                p(Color::Magenta),
                p(Color::Yellow),
                p(Color::Cyan),
                p(Color::Black),
                p(Color::White),
            ],
            menu_key: p(Color::Yellow),
            indicator: p(Color::Yellow),
            error: p(Color::LightRed),
        }
    }

    pub fn detect() -> Palette {
        Palette::new(Depth::detect())
    }

    pub fn number(&self, n: u8) -> Color {
        self.numbers[(n.clamp(1, 8) - 1) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_ansi_colors_by_depth() {
        assert_eq!(pin(Color::Red, Depth::TrueColor), Color::Rgb(197, 15, 31));
        assert_eq!(pin(Color::Red, Depth::Indexed256), Color::Indexed(160));
        assert_eq!(pin(Color::Red, Depth::Basic), Color::Red);
        assert_eq!(pin(Color::Rgb(1, 2, 3), Depth::TrueColor), Color::Rgb(1, 2, 3));
    }

    #[test]
    fn number_colors_are_clamped() {
        let palette = Palette::new(Depth::Basic);
        assert_eq!(palette.number(1), Color::Blue);
        assert_eq!(palette.number(8), Color::White);
        assert_eq!(palette.number(0), Color::Blue);
    }
}
