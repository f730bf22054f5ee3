//! cubeblast: grid resolution engine for a tile-matching cube blast puzzle.
//!
//! A [`turn::Engine`] owns the board. Each player selection resolves completely
//! (match, removal, obstacle damage, rockets, gravity) before the call returns, and
//! the ordered [`event::GridEvent`]s it produced come back with timing hints for
//! whoever animates them.

pub mod entity;
pub mod error;
pub mod event;
pub mod gravity;
pub mod grid;
pub mod level;
pub mod matcher;
pub mod obstacle;
pub mod rocket;
pub mod tile;
pub mod turn;

pub use entity::{Color, Direction, Entity};
pub use error::EngineError;
pub use event::{EventLog, GridEvent, TimedEvent};
pub use grid::{Grid, Pos};
pub use level::{LevelData, LevelError};
pub use turn::{BusyProbe, Engine, LevelStatus, NeverBusy, Rejection, TurnOutcome};
