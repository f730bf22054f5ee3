//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use cubeblast::entity::Color as CubeColor;
use cubeblast::obstacle::ObstacleKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Board and UI colours, One Dark unless a theme file says otherwise.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Cube colours in [`CubeColor::ALL`] order: red, green, blue, yellow.
    pub cubes: [Color; 4],
    /// Box, stone, vase.
    pub obstacles: [Color; 3],
    pub rocket: Color,
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Sidebar text.
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    pub inactive_fg: Color,
    pub cursor: Color,
    /// Colour touched cells fade from after a move.
    pub flash: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const RED: Color = Color::Rgb(0xE0, 0x6C, 0x75);
const GREEN: Color = Color::Rgb(0x98, 0xC3, 0x79);
const BLUE: Color = Color::Rgb(0x61, 0xAF, 0xEF);
const YELLOW: Color = Color::Rgb(0xE5, 0xC0, 0x7B);
const BOX: Color = Color::Rgb(0xD1, 0x9A, 0x66);
const STONE: Color = Color::Rgb(0x7F, 0x84, 0x8E);
const VASE: Color = Color::Rgb(0x56, 0xB6, 0xC2);
const ROCKET: Color = Color::Rgb(0xC6, 0x78, 0xDD);
const METER_BG: Color = Color::Rgb(0x31, 0x35, 0x3F);
const DIV_LINE: Color = Color::Rgb(0x3F, 0x44, 0x4F);
const MAIN_FG: Color = Color::Rgb(0xAB, 0xB2, 0xBF);
const INACTIVE_FG: Color = Color::Rgb(0x5C, 0x63, 0x70);
const WHITE: Color = Color::Rgb(0xFF, 0xFF, 0xFF);

impl Theme {
    /// Hardcoded One Dark defaults: hex values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            cubes: [RED, GREEN, BLUE, YELLOW],
            obstacles: [BOX, STONE, VASE],
            rocket: ROCKET,
            bg: METER_BG,
            div_line: DIV_LINE,
            main_fg: MAIN_FG,
            title: YELLOW,
            inactive_fg: INACTIVE_FG,
            cursor: WHITE,
            flash: WHITE,
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override cube colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.cubes = [
                    Color::Rgb(0xFF, 0x00, 0x00),
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                ];
                self.rocket = Color::Rgb(0xFF, 0x00, 0xFF);
            }
            Palette::Colorblind => {
                // Okabe-Ito style: no red/green pair.
                self.cubes = [
                    Color::Rgb(0xCC, 0x33, 0x11),
                    Color::Rgb(0x00, 0x99, 0x88),
                    Color::Rgb(0x00, 0x77, 0xBB),
                    Color::Rgb(0xEE, 0x77, 0x33),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str], fallback: Color| {
            keys.iter()
                .find_map(|key| map.get(*key).and_then(|v| parse_hex(v).ok()))
                .unwrap_or(fallback)
        };
        // Keys match onedark.theme.
        Self {
            cubes: [
                get(&["cpu_end", "temp_end"], RED),
                get(&["mem_box", "cpu_start"], GREEN),
                get(&["cpu_box"], BLUE),
                get(&["title", "cpu_mid"], YELLOW),
            ],
            obstacles: [
                get(&["used_mid", "download_mid"], BOX),
                get(&["inactive_fg"], STONE),
                get(&["hi_fg", "proc_misc"], VASE),
            ],
            rocket: get(&["net_box"], ROCKET),
            bg: get(&["meter_bg"], METER_BG),
            div_line: get(&["div_line"], DIV_LINE),
            main_fg: get(&["main_fg"], MAIN_FG),
            title: get(&["title"], YELLOW),
            inactive_fg: get(&["inactive_fg"], INACTIVE_FG),
            cursor: get(&["selected_fg"], WHITE),
            flash: get(&["hi_fg"], WHITE),
        }
    }

    #[inline]
    pub fn cube_color(&self, color: CubeColor) -> Color {
        self.cubes[color.index()]
    }

    #[inline]
    pub fn obstacle_color(&self, kind: ObstacleKind) -> Color {
        match kind {
            ObstacleKind::Box => self.obstacles[0],
            ObstacleKind::Stone => self.obstacles[1],
            ObstacleKind::Vase => self.obstacles[2],
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGHHII").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_file_overrides_cube_colours() {
        let map = parse_theme_file(
            "# comment\ntheme[cpu_end]=\"#FF0000\"\ntheme[main_fg]='#010203'\ntheme[broken\n",
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.cube_color(CubeColor::Red), Color::Rgb(0xFF, 0, 0));
        assert_eq!(theme.main_fg, Color::Rgb(1, 2, 3));
        assert_eq!(theme.cube_color(CubeColor::Blue), BLUE);
    }

    #[test]
    fn test_colorblind_palette_changes_cubes_only() {
        let mut theme = Theme::onedark_default();
        theme.apply_palette(Palette::Colorblind);
        assert_ne!(theme.cubes, Theme::onedark_default().cubes);
        assert_eq!(theme.bg, METER_BG);
    }
}
