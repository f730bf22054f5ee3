//! Tile codes: the level-data vocabulary for cell contents, and validated layouts.

use crate::entity::{Color, Direction, Entity};
use crate::error::EngineError;
use crate::event::GridEvent;
use crate::grid::{Grid, Pos};
use crate::obstacle::{Obstacle, ObstacleKind};
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What a snapshot says a cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileCode {
    Empty,
    Cube(Color),
    /// `rand`: a cube whose colour is rolled when the cell is populated.
    RandomCube,
    Obstacle(ObstacleKind),
    /// Only ever produced by the engine; level data cannot place rockets.
    Rocket(Direction),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tile code {0:?}")]
pub struct UnknownTileCode(pub String);

impl TileCode {
    /// Entity this code populates a cell with. Random cubes consume one roll.
    pub fn instantiate(self, rng: &mut impl Rng) -> Option<Entity> {
        match self {
            Self::Empty => None,
            Self::Cube(color) => Some(Entity::Cube(color)),
            Self::RandomCube => Some(Entity::Cube(Color::random(rng))),
            Self::Obstacle(kind) => Some(Entity::Obstacle(Obstacle::new(kind))),
            Self::Rocket(direction) => Some(Entity::Rocket(direction)),
        }
    }
}

impl FromStr for TileCode {
    type Err = UnknownTileCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "empty" => Self::Empty,
            "r" => Self::Cube(Color::Red),
            "g" => Self::Cube(Color::Green),
            "b" => Self::Cube(Color::Blue),
            "y" => Self::Cube(Color::Yellow),
            "rand" => Self::RandomCube,
            "bo" => Self::Obstacle(ObstacleKind::Box),
            "s" => Self::Obstacle(ObstacleKind::Stone),
            "v" => Self::Obstacle(ObstacleKind::Vase),
            other => return Err(UnknownTileCode(other.to_string())),
        })
    }
}

impl fmt::Display for TileCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Empty => "empty",
            Self::Cube(Color::Red) => "r",
            Self::Cube(Color::Green) => "g",
            Self::Cube(Color::Blue) => "b",
            Self::Cube(Color::Yellow) => "y",
            Self::RandomCube => "rand",
            Self::Obstacle(ObstacleKind::Box) => "bo",
            Self::Obstacle(ObstacleKind::Stone) => "s",
            Self::Obstacle(ObstacleKind::Vase) => "v",
            Self::Rocket(Direction::Horizontal) => "hro",
            Self::Rocket(Direction::Vertical) => "vro",
        };
        f.write_str(code)
    }
}

/// A fully parsed snapshot: either every code is valid or no layout exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    width: usize,
    height: usize,
    /// Row-major from the bottom row, same order as the source snapshot.
    codes: Vec<TileCode>,
}

impl Layout {
    pub fn parse<S: AsRef<str>>(
        width: usize,
        height: usize,
        codes: &[S],
    ) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::EmptyGrid { width, height });
        }
        let expected = width * height;
        if codes.len() != expected {
            return Err(EngineError::SnapshotSize {
                width,
                height,
                expected,
                actual: codes.len(),
            });
        }
        let codes = codes
            .iter()
            .enumerate()
            .map(|(i, code)| {
                code.as_ref()
                    .parse::<TileCode>()
                    .map_err(|UnknownTileCode(code)| EngineError::InvalidTileCode {
                        code,
                        pos: Pos::new((i % width) as i32, (i / width) as i32),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            width,
            height,
            codes,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Current codes of a populated board. Random cubes read as their rolled colour.
    pub fn of(grid: &Grid) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            codes: grid.positions().map(|pos| grid.tile_code(pos)).collect(),
        }
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x as usize >= self.width || pos.y as usize >= self.height {
            return None;
        }
        Some(pos.y as usize * self.width + pos.x as usize)
    }

    pub fn code(&self, pos: Pos) -> Option<TileCode> {
        self.index(pos).and_then(|i| self.codes.get(i).copied())
    }

    pub fn set(&mut self, pos: Pos, code: TileCode) {
        if let Some(i) = self.index(pos) {
            self.codes[i] = code;
        }
    }

    /// Follow one board change, so the codes keep matching the entities.
    pub fn apply(&mut self, event: &GridEvent) {
        match *event {
            GridEvent::EntityCreated { pos, entity } => self.set(pos, entity.tile_code()),
            GridEvent::EntityRemoved { pos, .. } => self.set(pos, TileCode::Empty),
            GridEvent::EntityMoved { from, to } => {
                let code = self.code(from).unwrap_or(TileCode::Empty);
                self.set(to, code);
                self.set(from, TileCode::Empty);
            }
            GridEvent::ObstacleDamaged { .. }
            | GridEvent::RocketTriggered { .. }
            | GridEvent::RocketExploded { .. } => {}
        }
    }
}
