//! App: terminal init, main loop, key and mouse handling.

use crate::GameConfig;
use crate::input::{Action, key_to_action, mouse_click};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use cubeblast::turn::{Action as TurnAction, Resolution};
use cubeblast::{BusyProbe, Engine, LevelStatus, Pos, TurnOutcome};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Shortest and longest flash after a move, after `--anim-speed` scaling.
const MIN_FLASH: Duration = Duration::from_millis(150);
const MAX_FLASH: Duration = Duration::from_millis(1500);
/// Event poll timeout, ~60 FPS.
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    QuitMenu,
    LevelOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

/// Cells flashing after the last move. Doubles as the engine's busy probe, so a cell
/// cannot be picked again until its flash is over.
#[derive(Default)]
pub struct Playback {
    pub cells: BTreeSet<Pos>,
    started: Option<Instant>,
    pub duration: Duration,
    /// TachyonFX fade (created on the first frame after a move).
    pub effect: Option<Effect>,
    /// Last time the effect was processed (for delta).
    pub process_time: Option<Instant>,
}

impl Playback {
    fn start(&mut self, resolution: &Resolution, config: &GameConfig) {
        self.clear();
        if config.no_animation {
            return;
        }
        let scaled = resolution.total_hint().as_secs_f64() / config.anim_speed;
        self.duration = Duration::from_secs_f64(scaled).clamp(MIN_FLASH, MAX_FLASH);
        self.cells = resolution.touched();
        self.started = Some(Instant::now());
    }

    pub fn is_running(&self) -> bool {
        self.started
            .is_some_and(|start| start.elapsed() < self.duration)
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.started = None;
        self.effect = None;
        self.process_time = None;
    }

    fn tick(&mut self) {
        let effect_done = self.effect.as_ref().is_some_and(Effect::done);
        if self.started.is_some() && (effect_done || !self.is_running()) {
            self.clear();
        }
    }
}

impl BusyProbe for Playback {
    fn is_busy(&self, pos: Pos) -> bool {
        self.is_running() && self.cells.contains(&pos)
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    engine: Engine,
    screen: Screen,
    cursor: Pos,
    quit_selected: QuitOption,
    message: String,
    playback: Playback,
    /// Board rect from the last frame, for mapping mouse clicks.
    board_rect: Option<Rect>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Result<Self> {
        let engine = config.level.engine(config.seed, config.moves)?;
        Ok(Self {
            config,
            theme,
            engine,
            screen: Screen::Playing,
            cursor: Pos::new(0, 0),
            quit_selected: QuitOption::Resume,
            message: String::from("Pick a group of two or more"),
            playback: Playback::default(),
            board_rect: None,
        })
    }

    fn restart(&mut self) -> Result<()> {
        self.engine = self.config.level.engine(self.config.seed, self.config.moves)?;
        self.screen = Screen::Playing;
        self.cursor = Pos::new(0, 0);
        self.message = String::from("Level restarted");
        self.playback.clear();
        log::info!("level {} restarted", self.config.level.level_number);
        Ok(())
    }

    fn move_cursor(&mut self, step: Pos) {
        let grid = self.engine.grid();
        let next = self.cursor + step;
        if grid.contains(next) {
            self.cursor = next;
        }
    }

    fn select(&mut self, pos: Pos) {
        match self.engine.handle_selection(pos, &self.playback) {
            TurnOutcome::Resolved(resolution) => {
                self.message = describe(&resolution);
                self.playback.start(&resolution, &self.config);
                if self.engine.status() != LevelStatus::InProgress {
                    log::info!("level over: {:?}", self.engine.status());
                    self.screen = Screen::LevelOver;
                }
            }
            TurnOutcome::Rejected(rejection) => {
                self.message = rejection.to_string();
            }
        }
    }

    /// Grid cell under a terminal position, if the click landed on the board.
    fn cell_at(&self, column: u16, row: u16) -> Option<Pos> {
        let rect = self.board_rect?;
        if column < rect.x || row < rect.y || column >= rect.right() || row >= rect.bottom() {
            return None;
        }
        let x = (column - rect.x) / crate::ui::CELL_WIDTH;
        let from_top = (row - rect.y) / crate::ui::CELL_HEIGHT;
        let y = self.engine.grid().height() as i32 - 1 - from_top as i32;
        let pos = Pos::new(x as i32, y);
        self.engine.grid().contains(pos).then_some(pos)
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                let view = crate::ui::View {
                    engine: &self.engine,
                    theme: &self.theme,
                    level_number: self.config.level.level_number,
                    screen: self.screen,
                    cursor: self.cursor,
                    quit_selected: self.quit_selected,
                    message: &self.message,
                };
                self.board_rect = Some(crate::ui::draw(f, &view, &mut self.playback, now));
            })?;
            self.playback.tick();

            if !event::poll(FRAME.saturating_sub(now.elapsed()))? {
                continue;
            }
            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if !self.handle_action(key_to_action(key))? {
                            return Ok(());
                        }
                    }
                    Event::Mouse(mouse) if self.screen == Screen::Playing => {
                        if let Some(pos) =
                            mouse_click(mouse).and_then(|(c, r)| self.cell_at(c, r))
                        {
                            self.cursor = pos;
                            self.select(pos);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Returns false when the player chose to exit.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Playing => match action {
                Action::Left => self.move_cursor(Pos::LEFT),
                Action::Right => self.move_cursor(Pos::RIGHT),
                Action::Up => self.move_cursor(Pos::UP),
                Action::Down => self.move_cursor(Pos::DOWN),
                Action::Select => self.select(self.cursor),
                Action::Restart => self.restart()?,
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                Action::None => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Restart => self.restart()?,
                    QuitOption::Exit => return Ok(false),
                },
                Action::Quit => self.screen = Screen::Playing,
                Action::Restart | Action::None => {}
            },
            Screen::LevelOver => match action {
                Action::Restart | Action::Select => self.restart()?,
                Action::Quit => return Ok(false),
                _ => {}
            },
        }
        Ok(true)
    }
}

/// Status line for an accepted move.
fn describe(resolution: &Resolution) -> String {
    match resolution.action {
        TurnAction::Blast { color, size } => format!("Blasted {size} {color:?} cubes"),
        TurnAction::RocketCreated { direction, .. } => format!("{direction:?} rocket ready"),
        TurnAction::RocketFired { .. } => {
            let removed = resolution
                .events
                .iter()
                .filter(|t| matches!(t.event, cubeblast::GridEvent::EntityRemoved { .. }))
                .count();
            format!("Rocket away! {removed} cells cleared")
        }
    }
}
