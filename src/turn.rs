//! Turn control: one player intent in, one fully settled resolution out.

use crate::entity::{Color, Direction, Entity};
use crate::error::EngineError;
use crate::event::{EventLog, GridEvent, TimedEvent};
use crate::gravity::{self, Fall};
use crate::grid::{Grid, Pos};
use crate::matcher::{self, Group};
use crate::obstacle;
use crate::rocket::{self, RocketPhase};
use crate::tile::Layout;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Lets the presentation layer veto actions on cells that are still animating.
pub trait BusyProbe {
    fn is_busy(&self, pos: Pos) -> bool;
}

/// A probe for callers without animations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverBusy;

impl BusyProbe for NeverBusy {
    fn is_busy(&self, _pos: Pos) -> bool {
        false
    }
}

impl<F: Fn(Pos) -> bool> BusyProbe for F {
    fn is_busy(&self, pos: Pos) -> bool {
        self(pos)
    }
}

/// Observable turn phase. `&mut Engine` already rules out re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    Resolving,
}

/// Why a selection was ignored. These are ordinary outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OutOfBounds,
    EmptyCell,
    /// Obstacles cannot be picked.
    NotSelectable,
    GroupTooSmall,
    /// The probe reported an animation on a cell the action needs.
    Busy,
    NotARocket,
    LevelOver,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OutOfBounds => "outside the board",
            Self::EmptyCell => "nothing there",
            Self::NotSelectable => "obstacles can't be picked",
            Self::GroupTooSmall => "needs two or more matching cubes",
            Self::Busy => "still animating",
            Self::NotARocket => "not a rocket",
            Self::LevelOver => "level is over",
        })
    }
}

/// What the player's action turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Blast { color: Color, size: usize },
    RocketCreated { pos: Pos, direction: Direction },
    RocketFired { pos: Pos },
}

/// Everything one accepted action did to the board, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub action: Action,
    pub events: Vec<TimedEvent>,
    pub falls: Vec<Fall>,
}

impl Resolution {
    /// Minimum time a renderer needs to replay the events.
    pub fn total_hint(&self) -> Duration {
        self.events.iter().map(|t| t.hint).sum()
    }

    /// Every cell any event changed, deduplicated.
    pub fn touched(&self) -> BTreeSet<Pos> {
        self.events.iter().flat_map(|t| t.event.touched()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Resolved(Resolution),
    Rejected(Rejection),
}

impl TurnOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::Resolved(resolution) => Some(resolution),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Resolved(_) => None,
            Self::Rejected(rejection) => Some(*rejection),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    InProgress,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub moves_made: u32,
    pub cubes_cleared: u32,
    pub obstacles_destroyed: u32,
    pub rockets_created: u32,
    pub rockets_fired: u32,
}

impl Stats {
    fn record(&mut self, resolution: &Resolution) {
        self.moves_made += 1;
        if let Action::RocketCreated { .. } = resolution.action {
            self.rockets_created += 1;
        }
        for timed in &resolution.events {
            match timed.event {
                GridEvent::EntityRemoved {
                    entity: Entity::Cube(_),
                    ..
                } => self.cubes_cleared += 1,
                GridEvent::EntityRemoved {
                    entity: Entity::Obstacle(_),
                    ..
                } => self.obstacles_destroyed += 1,
                // Combo partners leave without a trigger of their own.
                GridEvent::EntityRemoved {
                    entity: Entity::Rocket(_),
                    ..
                } => self.rockets_fired += 1,
                _ => {}
            }
        }
        // The cube a rocket replaces is not cleared.
        if let Action::RocketCreated { .. } = resolution.action {
            self.cubes_cleared = self.cubes_cleared.saturating_sub(1);
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

/// The resolution engine for one level. Owns the board and the dice.
#[derive(Debug, Clone)]
pub struct Engine {
    grid: Grid,
    /// Tile codes kept in step with `grid` by every event.
    view: Layout,
    rng: StdRng,
    state: TurnState,
    moves_left: Option<u32>,
    started_with_obstacles: bool,
    stats: Stats,
}

impl Engine {
    /// Wrap an already populated grid. Without a seed the RNG is seeded from entropy.
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        Self::with_rng(grid, seeded_rng(seed))
    }

    fn with_rng(grid: Grid, rng: StdRng) -> Self {
        Self {
            started_with_obstacles: grid.obstacles_remaining() > 0,
            view: Layout::of(&grid),
            grid,
            rng,
            state: TurnState::Idle,
            moves_left: None,
            stats: Stats::default(),
        }
    }

    /// Validate a bottom-up, row-major code list and build an engine from it.
    /// Any bad code fails the whole load.
    pub fn load_snapshot<S: AsRef<str>>(
        width: usize,
        height: usize,
        codes: &[S],
        seed: Option<u64>,
    ) -> Result<Self, EngineError> {
        let layout = Layout::parse(width, height, codes)?;
        Self::from_layout(&layout, seed)
    }

    pub fn from_layout(layout: &Layout, seed: Option<u64>) -> Result<Self, EngineError> {
        let mut rng = seeded_rng(seed);
        let grid = Grid::from_layout(layout, &mut rng)?;
        log::debug!(
            "loaded {}x{} grid with {} obstacles",
            grid.width(),
            grid.height(),
            grid.obstacles_remaining()
        );
        Ok(Self::with_rng(grid, rng))
    }

    /// Limit the level to `moves` accepted actions; `None` removes the limit.
    #[must_use]
    pub fn with_move_budget(mut self, moves: Option<u32>) -> Self {
        self.moves_left = moves;
        self
    }

    /// Populate empty cells the tile-code view marks as occupied. Cleared and
    /// vacated cells read as empty there, so nothing removed comes back.
    pub fn sync(&mut self) -> usize {
        self.grid.sync(&self.view, &mut self.rng)
    }

    pub fn tile_view(&self) -> &Layout {
        &self.view
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn moves_left(&self) -> Option<u32> {
        self.moves_left
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn snapshot(&self) -> Vec<Vec<String>> {
        self.grid.snapshot()
    }

    pub fn status(&self) -> LevelStatus {
        if self.started_with_obstacles && self.grid.obstacles_remaining() == 0 {
            LevelStatus::Won
        } else if self.moves_left == Some(0) {
            LevelStatus::Lost
        } else {
            LevelStatus::InProgress
        }
    }

    /// The player picked `pos`. Cubes blast or become a rocket; rockets fire.
    pub fn handle_selection(&mut self, pos: Pos, probe: &impl BusyProbe) -> TurnOutcome {
        let entity = match self.selectable(pos) {
            Ok(entity) => entity,
            Err(rejection) => return self.reject(pos, rejection),
        };
        match entity {
            Entity::Rocket(_) => self.fire(pos, probe),
            Entity::Obstacle(_) => self.reject(pos, Rejection::NotSelectable),
            Entity::Cube(_) => {
                let group = matcher::find_group(&self.grid, pos);
                if !group.is_actionable() {
                    return self.reject(pos, Rejection::GroupTooSmall);
                }
                if group.positions().iter().any(|&p| probe.is_busy(p)) {
                    return self.reject(pos, Rejection::Busy);
                }
                self.resolve_group(&group)
            }
        }
    }

    /// Fire the rocket at `pos` without any match search.
    pub fn activate_rocket(&mut self, pos: Pos, probe: &impl BusyProbe) -> TurnOutcome {
        match self.selectable(pos) {
            Ok(Entity::Rocket(_)) => self.fire(pos, probe),
            Ok(_) => self.reject(pos, Rejection::NotARocket),
            Err(rejection) => self.reject(pos, rejection),
        }
    }

    fn selectable(&self, pos: Pos) -> Result<Entity, Rejection> {
        if self.status() != LevelStatus::InProgress {
            return Err(Rejection::LevelOver);
        }
        if !self.grid.contains(pos) {
            return Err(Rejection::OutOfBounds);
        }
        self.grid.get(pos).copied().ok_or(Rejection::EmptyCell)
    }

    fn reject(&self, pos: Pos, rejection: Rejection) -> TurnOutcome {
        log::debug!("selection at {pos} rejected: {rejection}");
        TurnOutcome::Rejected(rejection)
    }

    fn resolve_group(&mut self, group: &Group) -> TurnOutcome {
        let (Some(origin), Some(color)) = (group.origin(), group.color()) else {
            return TurnOutcome::Rejected(Rejection::EmptyCell);
        };
        self.state = TurnState::Resolving;
        let mut log = EventLog::new();

        let action = if group.rocket_eligible() {
            match rocket::create_rocket(&mut self.grid, group, &mut self.rng, &mut log) {
                Some((pos, direction)) => Action::RocketCreated { pos, direction },
                None => {
                    self.state = TurnState::Idle;
                    return self.reject(origin, Rejection::GroupTooSmall);
                }
            }
        } else {
            for &pos in group.positions() {
                if let Some(entity) = self.grid.take(pos) {
                    log.push(GridEvent::EntityRemoved { pos, entity });
                }
            }
            obstacle::dispatch_adjacent_blast(&mut self.grid, group.positions(), &mut log);
            Action::Blast {
                color,
                size: group.len(),
            }
        };
        self.settle(action, log)
    }

    fn fire(&mut self, pos: Pos, probe: &impl BusyProbe) -> TurnOutcome {
        if probe.is_busy(pos) {
            return self.reject(pos, Rejection::Busy);
        }
        self.state = TurnState::Resolving;
        let mut log = EventLog::new();
        let phase = rocket::activate(&mut self.grid, pos, &mut log);
        debug_assert_eq!(phase, RocketPhase::Exploded);
        self.settle(Action::RocketFired { pos }, log)
    }

    /// Compact until nothing moves, then close the turn.
    fn settle(&mut self, action: Action, mut log: EventLog) -> TurnOutcome {
        let mut falls = Vec::new();
        loop {
            let moved = gravity::compact(&mut self.grid, &mut log);
            if moved.is_empty() {
                break;
            }
            falls.extend(moved);
        }
        debug_assert!(gravity::is_settled(&self.grid));
        for event in log.iter() {
            self.view.apply(event);
        }
        debug_assert_eq!(self.view, Layout::of(&self.grid));

        let resolution = Resolution {
            action,
            events: log.into_events(),
            falls,
        };
        self.stats.record(&resolution);
        if let Some(moves) = self.moves_left.as_mut() {
            *moves = moves.saturating_sub(1);
        }
        self.state = TurnState::Idle;
        log::debug!(
            "{:?} resolved with {} events, {} falls, status {:?}",
            resolution.action,
            resolution.events.len(),
            resolution.falls.len(),
            self.status()
        );
        TurnOutcome::Resolved(resolution)
    }
}
