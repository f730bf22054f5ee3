//! Layout and drawing: board, sidebar, quit menu, level-over overlay and the move flash.

use crate::app::{Playback, QuitOption, Screen};
use crate::theme::Theme;
use cubeblast::entity::{Direction as RocketDirection, Entity};
use cubeblast::obstacle::ObstacleKind;
use cubeblast::{Engine, LevelStatus, Pos};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per grid cell.
pub const CELL_WIDTH: u16 = 4;
pub const CELL_HEIGHT: u16 = 2;
const SIDEBAR_WIDTH: u16 = 28;

/// What the app hands over for one frame.
pub struct View<'a> {
    pub engine: &'a Engine,
    pub theme: &'a Theme,
    pub level_number: u32,
    pub screen: Screen,
    pub cursor: Pos,
    pub quit_selected: QuitOption,
    pub message: &'a str,
}

/// Board size in terminal cells (border included) for the given grid.
fn board_outer_size(width: usize, height: usize) -> (u16, u16) {
    (
        width as u16 * CELL_WIDTH + 2,
        height as u16 * CELL_HEIGHT + 2,
    )
}

/// Draw the current screen. Returns the inner board rect so clicks can be mapped back to
/// cells.
pub fn draw(frame: &mut Frame, view: &View, playback: &mut Playback, now: Instant) -> Rect {
    let area = frame.area();
    frame
        .buffer_mut()
        .set_style(area, Style::default().bg(view.theme.bg));
    let board_rect = draw_game(frame, view, area);
    if playback.is_running() {
        apply_flash_effect(frame, view, board_rect, playback, now);
    }
    match view.screen {
        Screen::Playing => {}
        Screen::QuitMenu => draw_quit_menu(frame, view.theme, view.quit_selected),
        Screen::LevelOver => draw_level_over(frame, view, area),
    }
    board_rect
}

/// Board + sidebar, centred.
fn draw_game(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let grid = view.engine.grid();
    let (pw, ph) = board_outer_size(grid.width(), grid.height());
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph.max(18)),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);

    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);

    let board_area = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    let board_rect = draw_board(frame.buffer_mut(), view, board_area);
    draw_sidebar(frame, view, inner[1]);
    board_rect
}

fn draw_board(buf: &mut Buffer, view: &View, area: Rect) -> Rect {
    let theme = view.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(
            format!(" cubeblast  | Level {} ", view.level_number),
            theme.title,
        ));
    let inner = block.inner(area);
    block.render(area, buf);

    let grid = view.engine.grid();
    for pos in grid.positions() {
        let Some(rect) = cell_rect(inner, grid.height(), pos) else {
            continue;
        };
        let (rows, style) = match grid.get(pos) {
            None => (["    ", "    "], Style::default().fg(theme.div_line).bg(theme.bg)),
            Some(entity) => entity_glyph(theme, entity),
        };
        for (dy, row) in rows.iter().enumerate() {
            buf.set_string(rect.x, rect.y + dy as u16, row, style);
        }
        if let Some(Entity::Obstacle(obstacle)) = grid.get(pos) {
            if obstacle.kind() == ObstacleKind::Vase {
                buf.set_string(rect.x + 3, rect.y + 1, obstacle.health().to_string(), style);
            }
        }
        if pos == view.cursor && view.screen == Screen::Playing {
            let cursor = style.fg(theme.cursor);
            for dy in 0..CELL_HEIGHT {
                buf.set_string(rect.x, rect.y + dy, "▐", cursor);
                buf.set_string(rect.x + CELL_WIDTH - 1, rect.y + dy, "▌", cursor);
            }
        }
    }
    inner
}

/// Terminal rect of a grid cell. Row 0 is drawn at the bottom.
fn cell_rect(board: Rect, grid_height: usize, pos: Pos) -> Option<Rect> {
    let row_from_top = grid_height as i32 - 1 - pos.y;
    if pos.x < 0 || row_from_top < 0 {
        return None;
    }
    let rect = Rect {
        x: board.x + pos.x as u16 * CELL_WIDTH,
        y: board.y + row_from_top as u16 * CELL_HEIGHT,
        width: CELL_WIDTH,
        height: CELL_HEIGHT,
    };
    (rect.right() <= board.right() && rect.bottom() <= board.bottom()).then_some(rect)
}

fn entity_glyph(theme: &Theme, entity: &Entity) -> ([&'static str; 2], Style) {
    match entity {
        Entity::Cube(color) => {
            let c = theme.cube_color(*color);
            (["▗▄▄▖", "▝▀▀▘"], Style::default().fg(c).bg(theme.bg))
        }
        Entity::Obstacle(obstacle) => {
            let c = theme.obstacle_color(obstacle.kind());
            let rows = match obstacle.kind() {
                ObstacleKind::Box => ["┌──┐", "└──┘"],
                ObstacleKind::Stone => ["▓▓▓▓", "▓▓▓▓"],
                ObstacleKind::Vase => [" ╭╮ ", " ╰╯ "],
            };
            (rows, Style::default().fg(c).bg(theme.bg))
        }
        Entity::Rocket(direction) => {
            let rows = match direction {
                RocketDirection::Horizontal => ["◀══▶", "◀══▶"],
                RocketDirection::Vertical => [" ▲▲ ", " ▼▼ "],
            };
            (rows, Style::default().fg(theme.rocket).bg(theme.bg).bold())
        }
    }
}

/// Buffer positions covered by the flashing grid cells.
fn flash_buffer_positions(board: Rect, grid_height: usize, cells: &[Pos]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &pos in cells {
        let Some(rect) = cell_rect(board, grid_height, pos) else {
            continue;
        };
        for bx in rect.left()..rect.right() {
            for by in rect.top()..rect.bottom() {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create the fade-from-flash effect on the first frame of a playback, then advance it.
fn apply_flash_effect(
    frame: &mut Frame,
    view: &View,
    board_rect: Rect,
    playback: &mut Playback,
    now: Instant,
) {
    let delta = playback
        .process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let tfx_delta = TfxDuration::from_millis(delta.as_millis().min(u32::MAX as u128) as u32);
    playback.process_time = Some(now);

    if playback.effect.is_none() {
        let cells: Vec<Pos> = playback.cells.iter().copied().collect();
        let flash_set = flash_buffer_positions(board_rect, view.engine.grid().height(), &cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            flash_set.contains(&(pos.x, pos.y))
        }));
        let ms = playback.duration.as_millis().min(u32::MAX as u128) as u32;
        let flash = view.theme.flash;
        let effect = fx::fade_from(flash, flash, (ms, Interpolation::QuadOut))
            .with_filter(filter)
            .with_area(board_rect);
        playback.effect = Some(effect);
    }

    if let Some(effect) = playback.effect.as_mut() {
        frame.render_effect(effect, board_rect, tfx_delta);
    }
}

fn sidebar_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let engine = view.engine;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Goal (moves, obstacles)
            Constraint::Length(6), // Stats
            Constraint::Length(3), // Message
            Constraint::Min(4),    // Legend
        ])
        .split(area);

    let stat = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label}: "), title_style),
            Span::styled(value, fg_style),
        ])
    };

    // --- Goal ---
    let moves = engine
        .moves_left()
        .map_or_else(|| "∞".to_string(), |m| m.to_string());
    let goal = vec![
        stat("Level", view.level_number.to_string()),
        stat("Moves", moves),
        stat("Obstacles", engine.grid().obstacles_remaining().to_string()),
    ];
    Paragraph::new(Text::from(goal))
        .block(sidebar_block(theme))
        .render(chunks[0], frame.buffer_mut());

    // --- Stats ---
    let stats = engine.stats();
    let lines = vec![
        stat("Cubes", stats.cubes_cleared.to_string()),
        stat("Broken", stats.obstacles_destroyed.to_string()),
        stat("Rockets", format!("{} / {}", stats.rockets_created, stats.rockets_fired)),
        stat("Moves made", stats.moves_made.to_string()),
    ];
    Paragraph::new(Text::from(lines))
        .block(sidebar_block(theme))
        .render(chunks[1], frame.buffer_mut());

    // --- Message ---
    Paragraph::new(Line::from(Span::styled(view.message, fg_style)))
        .block(sidebar_block(theme))
        .render(chunks[2], frame.buffer_mut());

    // --- Legend ---
    let hint = Style::default().fg(theme.inactive_fg);
    let swatch = |color: Color, glyph: &'static str, label: &'static str| {
        Line::from(vec![
            Span::styled(glyph, Style::default().fg(color)),
            Span::styled(label, hint),
        ])
    };
    let legend = vec![
        swatch(theme.obstacle_color(ObstacleKind::Box), "┌┐ ", "box: any blast"),
        swatch(theme.obstacle_color(ObstacleKind::Stone), "▓▓ ", "stone: rockets only"),
        swatch(theme.obstacle_color(ObstacleKind::Vase), "╭╮ ", "vase: two hits"),
        swatch(theme.rocket, "◀▶ ", "rocket: select to fire"),
        Line::from(Span::styled("hjkl/arrows  ⏎ select", hint)),
        Line::from(Span::styled("r restart    q quit", hint)),
    ];
    Paragraph::new(Text::from(legend))
        .block(sidebar_block(theme))
        .render(chunks[3], frame.buffer_mut());
}

fn draw_level_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let popup_w = 30u16;
    let popup_h = 9u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let (title, colors) = match view.engine.status() {
        LevelStatus::Won => (" Level cleared! ", (Color::Black, Color::Green)),
        _ => (" Out of moves ", (Color::White, Color::Red)),
    };
    let stats = view.engine.stats();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default().fg(colors.0).bg(colors.1),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Moves: {}  Cubes: {} ", stats.moves_made, stats.cubes_cleared),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R: Restart    Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    frame
        .buffer_mut()
        .set_style(popup, Style::default().bg(theme.bg));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" cubeblast ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let qw = 24;
    let qh = 8;
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw.min(area.width),
        height: qh.min(area.height),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    frame
        .buffer_mut()
        .set_style(quit_rect, Style::default().bg(theme.bg));
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
