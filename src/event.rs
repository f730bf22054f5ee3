//! Resolution events: the transitions a presentation layer replays, with timing hints.

use crate::entity::{Direction, Entity};
use crate::grid::Pos;
use std::time::Duration;

/// Delay between consecutive cells of a rocket sweep.
pub const SWEEP_STEP_HINT: Duration = Duration::from_millis(50);
/// Delay between consecutive cells of a combo area blast.
pub const AREA_CELL_HINT: Duration = Duration::from_millis(20);
/// Duration of one fall move.
pub const FALL_HINT: Duration = Duration::from_millis(120);

/// One discrete state transition. Each variant carries everything a renderer needs
/// without re-querying the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    EntityCreated {
        pos: Pos,
        entity: Entity,
    },
    EntityRemoved {
        pos: Pos,
        entity: Entity,
    },
    EntityMoved {
        from: Pos,
        to: Pos,
    },
    ObstacleDamaged {
        pos: Pos,
        remaining_health: u8,
    },
    /// A rocket left the board and started its effect. `combo` means the 3x3 blast
    /// with its neighbours; `chained` means another explosion set it off.
    RocketTriggered {
        pos: Pos,
        direction: Direction,
        combo: bool,
        chained: bool,
    },
    /// Every sweep and area blast of the rocket at `pos` has finished.
    RocketExploded {
        pos: Pos,
    },
}

impl GridEvent {
    /// Cells whose appearance changes with this event.
    pub fn touched(&self) -> impl Iterator<Item = Pos> + use<> {
        let (a, b) = match *self {
            Self::EntityCreated { pos, .. }
            | Self::EntityRemoved { pos, .. }
            | Self::ObstacleDamaged { pos, .. }
            | Self::RocketTriggered { pos, .. }
            | Self::RocketExploded { pos } => (pos, None),
            Self::EntityMoved { from, to } => (from, Some(to)),
        };
        std::iter::once(a).chain(b)
    }
}

/// An event plus how long a renderer should wait before showing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub event: GridEvent,
    pub hint: Duration,
}

/// Ordered record of one resolution cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<TimedEvent>,
    /// Delay carried onto the next pushed event.
    pending: Duration,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GridEvent) {
        self.push_timed(event, Duration::ZERO);
    }

    pub fn push_timed(&mut self, event: GridEvent, hint: Duration) {
        let hint = hint + std::mem::take(&mut self.pending);
        log::trace!("event {:?} (+{}ms)", event, hint.as_millis());
        self.events.push(TimedEvent { event, hint });
    }

    /// Let time pass without an event, e.g. a sweep crossing an empty cell.
    pub fn delay(&mut self, hint: Duration) {
        self.pending += hint;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridEvent> {
        self.events.iter().map(|t| &t.event)
    }

    /// Sum of all hints: the minimum playback length of the cycle.
    pub fn total_hint(&self) -> Duration {
        self.events.iter().map(|t| t.hint).sum()
    }

    pub fn into_events(self) -> Vec<TimedEvent> {
        self.events
    }
}
