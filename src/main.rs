//! cubeblast: tap-to-blast cube puzzle in the terminal.

mod app;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use cubeblast::LevelData;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Options derived from the CLI that shape a play session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub level: LevelData,
    pub seed: Option<u64>,
    pub moves: Option<u32>,
    pub no_animation: bool,
    pub anim_speed: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log.as_deref() {
        setup_logging(path, args.log_level.into())?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let level = match args.level.as_deref() {
        Some(path) => LevelData::load(path)?,
        None => LevelData::builtin()?,
    };
    let config = GameConfig {
        level,
        seed: args.seed,
        moves: args.moves,
        no_animation: args.no_animation,
        anim_speed: args.anim_speed.clamp(0.1, 10.0),
    };
    let mut app = App::new(config, theme)?;
    app.run()?;
    Ok(())
}

/// The terminal owns stdout, so log lines go to a file.
fn setup_logging(path: &Path, level: LevelFilter) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    WriteLogger::init(
        level,
        ConfigBuilder::new()
            .set_target_level(LevelFilter::Error)
            .build(),
        file,
    )?;
    log::info!("logging to {} at {level}", path.display());
    Ok(())
}

/// Tap-to-blast cube puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "cubeblast",
    version,
    about = "Tap-to-blast cube puzzle in the terminal. Pop groups of matching cubes, build rockets, clear every obstacle.",
    long_about = "cubeblast is a terminal tile-matching puzzle.\n\n\
        Select a cube to blast its group of two or more same-coloured neighbours. Groups of four \
        or more become a rocket instead. Fire a rocket to sweep its row or column; rockets next \
        to each other blow up a 3x3 area. Boxes and vases break next to a blast, stones only \
        to rockets. Clear every obstacle before the moves run out.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Enter / Space  Select    Mouse  Click a cell\n  \
        R              Restart        Q / Esc        Quit menu\n\n\
        Use --level to play a JSON level file and --theme to load a btop-style theme."
)]
pub struct Args {
    /// Level file (JSON with level_number, grid_width, grid_height, move_count, grid). Uses the bundled level if not set.
    #[arg(short, long, value_name = "FILE")]
    pub level: Option<PathBuf>,

    /// Seed for random cubes and rocket directions. Random if not set.
    #[arg(short, long, value_name = "N")]
    pub seed: Option<u64>,

    /// Override the level's move count.
    #[arg(short, long, value_name = "N")]
    pub moves: Option<u32>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable blast and fall animation (board updates instantly).
    #[arg(long)]
    pub no_animation: bool,

    /// Animation speed multiplier; 2.0 plays twice as fast.
    #[arg(long, default_value = "1.0", value_name = "FACTOR")]
    pub anim_speed: f64,

    /// Write a debug log to this file.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Log verbosity when --log is given.
    #[arg(long, default_value = "debug")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}
