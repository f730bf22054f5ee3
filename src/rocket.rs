//! Rocket creation, directional sweeps, the combo area blast and chain triggering.

use crate::entity::{Direction, Entity};
use crate::event::{AREA_CELL_HINT, EventLog, GridEvent, SWEEP_STEP_HINT};
use crate::grid::{Grid, Pos};
use crate::matcher::Group;
use crate::obstacle::{self, DamageSource};
use rand::Rng;

/// Half-width of the combo blast square: radius 1 is a 3x3 block.
pub const COMBO_RADIUS: i32 = 1;

/// Lifecycle of one activation. `Sweeping` only exists while [`activate`] runs; callers
/// see it through [`GridEvent::RocketTriggered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RocketPhase {
    Idle,
    Sweeping,
    Exploded,
}

/// Replace the origin cube of a rocket-eligible group with a rocket pointing in a
/// random direction. The rest of the group stays on the board.
///
/// Returns `None`, touching nothing, if the group is too small or its origin no longer
/// holds a cube.
pub fn create_rocket(
    grid: &mut Grid,
    group: &Group,
    rng: &mut impl Rng,
    log: &mut EventLog,
) -> Option<(Pos, Direction)> {
    if !group.rocket_eligible() {
        return None;
    }
    let pos = group.origin()?;
    if !grid.get(pos).is_some_and(Entity::is_matchable) {
        return None;
    }
    let cube = grid.take(pos)?;
    log.push(GridEvent::EntityRemoved { pos, entity: cube });

    let direction = Direction::random(rng);
    let rocket = Entity::Rocket(direction);
    grid.place(pos, rocket);
    log.push(GridEvent::EntityCreated {
        pos,
        entity: rocket,
    });
    log::debug!("{direction:?} rocket created at {pos} from a group of {}", group.len());
    Some((pos, direction))
}

/// Fire the rocket at `pos`, running every chain it sets off before returning.
///
/// Anything other than a rocket at `pos` leaves the grid alone and yields
/// [`RocketPhase::Idle`].
pub fn activate(grid: &mut Grid, pos: Pos, log: &mut EventLog) -> RocketPhase {
    let mut detonation = Detonation {
        grid,
        log,
        fired: 0,
    };
    if detonation.trigger(pos, false) {
        log::debug!("rocket at {pos} exploded, {} rockets fired", detonation.fired);
        RocketPhase::Exploded
    } else {
        RocketPhase::Idle
    }
}

struct Detonation<'a> {
    grid: &'a mut Grid,
    log: &'a mut EventLog,
    fired: usize,
}

impl Detonation<'_> {
    /// Returns false if there was no rocket at `pos`. A rocket leaves the grid before
    /// its effects run, so it can never be reached twice.
    fn trigger(&mut self, pos: Pos, chained: bool) -> bool {
        let Some(Entity::Rocket(direction)) = self.grid.get(pos).copied() else {
            return false;
        };
        // Chained rockets always sweep; only a direct activation looks for partners.
        let partners = if chained {
            Vec::new()
        } else {
            self.adjacent_rockets(pos)
        };
        let combo = !partners.is_empty();
        self.fired += 1;
        log::trace!("{} {direction:?} rocket at {pos}", if chained { "chain" } else { "fire" });

        self.log.push(GridEvent::RocketTriggered {
            pos,
            direction,
            combo,
            chained,
        });
        self.remove(pos);
        for &partner in &partners {
            self.remove(partner);
        }

        if combo {
            self.explode_area(pos, COMBO_RADIUS);
        } else {
            for step in direction.sweep_steps() {
                self.sweep_from(pos, step);
            }
        }
        self.log.push(GridEvent::RocketExploded { pos });
        true
    }

    fn adjacent_rockets(&self, pos: Pos) -> Vec<Pos> {
        pos.neighbors()
            .into_iter()
            .filter(|&n| self.grid.get(n).is_some_and(Entity::is_explodable))
            .collect()
    }

    fn remove(&mut self, pos: Pos) {
        if let Some(entity) = self.grid.take(pos) {
            self.log.push(GridEvent::EntityRemoved { pos, entity });
        }
    }

    /// Walk from `origin` (exclusive) in `step` until the edge or a blocker.
    fn sweep_from(&mut self, origin: Pos, step: Pos) {
        let mut pos = origin + step;
        while self.grid.contains(pos) {
            self.log.delay(SWEEP_STEP_HINT);
            match self.grid.get(pos).copied() {
                None => {}
                Some(Entity::Cube(_)) => self.remove(pos),
                Some(Entity::Rocket(_)) => {
                    self.trigger(pos, true);
                    return;
                }
                Some(Entity::Obstacle(hit)) => {
                    obstacle::damage_at(self.grid, pos, DamageSource::Rocket, 1, self.log);
                    if !hit.kind().can_fall() {
                        return;
                    }
                }
            }
            pos = pos + step;
        }
    }

    /// Column by column, bottom to top, over the in-bounds part of the square.
    fn explode_area(&mut self, center: Pos, radius: i32) {
        for x in center.x - radius..=center.x + radius {
            for y in center.y - radius..=center.y + radius {
                let pos = Pos::new(x, y);
                if !self.grid.contains(pos) {
                    continue;
                }
                self.log.delay(AREA_CELL_HINT);
                match self.grid.get(pos).copied() {
                    None => {}
                    Some(Entity::Cube(_)) => self.remove(pos),
                    Some(Entity::Obstacle(_)) => {
                        obstacle::damage_at(self.grid, pos, DamageSource::Rocket, 1, self.log);
                    }
                    Some(Entity::Rocket(_)) => {
                        self.trigger(pos, true);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::find_group;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use test_log::test;

    fn fire(grid: &mut Grid, pos: Pos) -> EventLog {
        let mut log = EventLog::new();
        assert_eq!(activate(grid, pos, &mut log), RocketPhase::Exploded);
        log
    }

    fn triggered(log: &EventLog) -> Vec<(Pos, bool, bool)> {
        log.iter()
            .filter_map(|e| match *e {
                GridEvent::RocketTriggered {
                    pos, combo, chained, ..
                } => Some((pos, combo, chained)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_create_rocket_replaces_only_the_origin() {
        let mut grid = Grid::from_rows(&["g g g g", "r r r r"]);
        let group = find_group(&grid, Pos::new(2, 0));
        let mut log = EventLog::new();
        let mut rng = StdRng::seed_from_u64(1);
        let (pos, direction) = create_rocket(&mut grid, &group, &mut rng, &mut log).unwrap();

        assert_eq!(pos, Pos::new(2, 0));
        assert_eq!(grid.get(pos), Some(&Entity::Rocket(direction)));
        assert_eq!(grid.to_rows()[1].split(' ').filter(|&c| c == "r").count(), 3);
        let events: Vec<_> = log.iter().collect();
        assert!(matches!(events[0], GridEvent::EntityRemoved { pos: p, entity: Entity::Cube(_) } if *p == pos));
        assert!(matches!(events[1], GridEvent::EntityCreated { pos: p, .. } if *p == pos));
    }

    #[test]
    fn test_create_rocket_needs_eligible_group() {
        let mut grid = Grid::from_rows(&["r r r g"]);
        let group = find_group(&grid, Pos::new(0, 0));
        let mut log = EventLog::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(create_rocket(&mut grid, &group, &mut rng, &mut log), None);
        assert!(log.is_empty());
        assert_eq!(grid.to_rows(), vec!["r r r g"]);
    }

    #[test]
    fn test_activating_a_non_rocket_is_a_no_op() {
        let mut grid = Grid::from_rows(&["r . bo"]);
        let mut log = EventLog::new();
        for x in 0..4 {
            assert_eq!(activate(&mut grid, Pos::new(x, 0), &mut log), RocketPhase::Idle);
        }
        assert!(log.is_empty());
    }

    #[test]
    fn test_horizontal_sweep_clears_row_only() {
        let mut grid = Grid::from_rows(&[
            "g g g g g",
            "r b . y r",
            "g g g g g",
        ]);
        grid.take(Pos::new(2, 1));
        grid.place(Pos::new(2, 1), Entity::Rocket(Direction::Horizontal));
        fire(&mut grid, Pos::new(2, 1));
        assert_eq!(grid.to_rows(), vec!["g g g g g", ". . . . .", "g g g g g"]);
    }

    #[test]
    fn test_sweep_stops_at_stone_and_box() {
        let mut grid = Grid::from_rows(&["r s y hro b bo g"]);
        let log = fire(&mut grid, Pos::new(3, 0));
        // Both blockers take the hit and are destroyed; cells past them survive.
        assert_eq!(grid.to_rows(), vec!["r . . . . . g"]);
        let removed = log
            .iter()
            .filter(|e| matches!(e, GridEvent::EntityRemoved { .. }))
            .count();
        assert_eq!(removed, 5);
    }

    #[test]
    fn test_sweep_passes_through_vase() {
        let mut grid = Grid::from_rows(&["vro", "y", "v", "r", "."]);
        let log = fire(&mut grid, Pos::new(0, 4));
        assert_eq!(grid.to_rows(), vec![".", ".", "v", ".", "."]);
        assert!(log.iter().any(|e| matches!(
            e,
            GridEvent::ObstacleDamaged {
                remaining_health: 1,
                ..
            }
        )));
    }

    #[test]
    fn test_sweep_hints_accumulate_per_step() {
        let mut grid = Grid::from_rows(&["hro . . r"]);
        let log = fire(&mut grid, Pos::new(0, 0));
        let events = log.into_events();
        let removed_cube = events
            .iter()
            .find(|t| matches!(t.event, GridEvent::EntityRemoved { entity: Entity::Cube(_), .. }))
            .unwrap();
        assert_eq!(removed_cube.hint, SWEEP_STEP_HINT * 3);
    }

    #[test]
    fn test_adjacent_rockets_make_one_area_blast() {
        let mut grid = Grid::from_rows(&[
            "r r r r r",
            "r hro vro r r",
            "r r r r r",
            "y y y y y",
        ]);
        let log = fire(&mut grid, Pos::new(1, 2));
        assert_eq!(triggered(&log), vec![(Pos::new(1, 2), true, false)]);
        // 3x3 around (1, 2) only; no sweep ran along row 2 or column 1.
        assert_eq!(
            grid.to_rows(),
            vec![". . . r r", ". . . r r", ". . . r r", "y y y y y"]
        );
        let exploded = log
            .iter()
            .filter(|e| matches!(e, GridEvent::RocketExploded { .. }))
            .count();
        assert_eq!(exploded, 1);
    }

    #[test]
    fn test_area_blast_chains_diagonal_rocket() {
        let mut grid = Grid::from_rows(&[
            "vro . . .",
            ". hro hro .",
            "r r r r",
        ]);
        let log = fire(&mut grid, Pos::new(1, 1));
        assert_eq!(
            triggered(&log),
            vec![(Pos::new(1, 1), true, false), (Pos::new(0, 2), false, true)]
        );
        assert!(grid.get(Pos::new(0, 2)).is_none());
        assert_eq!(grid.to_rows()[2], ". . . r");
    }

    #[test]
    fn test_sweep_chains_and_stops() {
        let mut grid = Grid::from_rows(&[
            ". . g .",
            "hro r vro y",
            ". . b .",
        ]);
        let log = fire(&mut grid, Pos::new(0, 1));
        assert_eq!(
            triggered(&log),
            vec![(Pos::new(0, 1), false, false), (Pos::new(2, 1), false, true)]
        );
        // The first sweep stopped at the vertical rocket, so the yellow cube remains.
        assert_eq!(grid.to_rows(), vec![". . . .", ". . . y", ". . . ."]);
    }

    #[test]
    fn test_no_rocket_fires_twice() {
        let mut grid = Grid::from_rows(&["hro . hro . hro"]);
        let log = fire(&mut grid, Pos::new(2, 0));
        let fired = triggered(&log);
        assert_eq!(fired.len(), 3);
        let mut positions: Vec<_> = fired.iter().map(|f| f.0).collect();
        positions.dedup();
        assert_eq!(positions.len(), 3);
        assert_eq!(grid.entities().count(), 0);
    }
}
