//! Obstacles: health, damage-source vulnerability and destruction.

use crate::entity::Entity;
use crate::event::{EventLog, GridEvent};
use crate::grid::{Grid, Pos};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    Box,
    Stone,
    Vase,
}

/// Where a hit comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageSource {
    /// A neighbouring cube was removed by a plain match.
    AdjacentBlast,
    /// A rocket sweep or area blast.
    Rocket,
}

impl ObstacleKind {
    pub const ALL: [Self; 3] = [Self::Box, Self::Stone, Self::Vase];

    pub fn initial_health(self) -> u8 {
        match self {
            Self::Box | Self::Stone => 1,
            Self::Vase => 2,
        }
    }

    /// Vases drop like cubes; boxes and stones anchor their column and stop rocket sweeps.
    pub fn can_fall(self) -> bool {
        matches!(self, Self::Vase)
    }

    pub fn is_vulnerable_to(self, source: DamageSource) -> bool {
        match self {
            Self::Box | Self::Vase => true,
            Self::Stone => source == DamageSource::Rocket,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Stone => "stone",
            Self::Vase => "vase",
        }
    }
}

/// Result of one damage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Damage {
    /// Wrong source, or the obstacle is already gone.
    Immune,
    Damaged { remaining: u8 },
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obstacle {
    kind: ObstacleKind,
    health: u8,
}

impl Obstacle {
    pub fn new(kind: ObstacleKind) -> Self {
        Self {
            kind,
            health: kind.initial_health(),
        }
    }

    pub fn kind(&self) -> ObstacleKind {
        self.kind
    }

    pub fn health(&self) -> u8 {
        self.health
    }

    pub fn is_destroyed(&self) -> bool {
        self.health == 0
    }

    /// Apply a hit. A vase takes at most 1 from an adjacent blast whatever `amount`
    /// asks for. `Destroyed` is reported once; later calls are `Immune`.
    pub fn take_damage(&mut self, source: DamageSource, amount: u8) -> Damage {
        if self.is_destroyed() || !self.kind.is_vulnerable_to(source) {
            return Damage::Immune;
        }
        let amount = match (self.kind, source) {
            (ObstacleKind::Vase, DamageSource::AdjacentBlast) => amount.min(1),
            _ => amount,
        };
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            Damage::Destroyed
        } else {
            Damage::Damaged {
                remaining: self.health,
            }
        }
    }
}

/// Damage whatever obstacle sits at `pos`, removing it from the grid when destroyed.
/// Empty cells, cubes, rockets and off-board positions are left alone.
pub fn damage_at(
    grid: &mut Grid,
    pos: Pos,
    source: DamageSource,
    amount: u8,
    log: &mut EventLog,
) -> Damage {
    let Some(Entity::Obstacle(obstacle)) = grid.get_mut(pos) else {
        return Damage::Immune;
    };
    let damage = obstacle.take_damage(source, amount);
    let kind = obstacle.kind();
    match damage {
        Damage::Immune => {}
        Damage::Damaged { remaining } => {
            log::debug!("{} at {pos} damaged, {remaining} health left", kind.name());
            log.push(GridEvent::ObstacleDamaged {
                pos,
                remaining_health: remaining,
            });
        }
        Damage::Destroyed => {
            log::debug!("{} at {pos} destroyed by {source:?}", kind.name());
            if let Some(entity) = grid.take(pos) {
                log.push(GridEvent::EntityRemoved { pos, entity });
            }
        }
    }
    damage
}

/// Hit every distinct 4-neighbour of the removed cells once with adjacent-blast damage.
/// Returns the probed neighbours in first-seen order.
pub fn dispatch_adjacent_blast(grid: &mut Grid, removed: &[Pos], log: &mut EventLog) -> Vec<Pos> {
    let removed_set: HashSet<Pos> = removed.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut hit = Vec::new();
    for pos in removed {
        for neighbor in pos.neighbors() {
            if !grid.contains(neighbor) || removed_set.contains(&neighbor) {
                continue;
            }
            if seen.insert(neighbor) {
                hit.push(neighbor);
            }
        }
    }
    for &pos in &hit {
        damage_at(grid, pos, DamageSource::AdjacentBlast, 1, log);
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_vulnerability_table() {
        use DamageSource::{AdjacentBlast, Rocket};
        assert!(ObstacleKind::Box.is_vulnerable_to(AdjacentBlast));
        assert!(ObstacleKind::Box.is_vulnerable_to(Rocket));
        assert!(!ObstacleKind::Stone.is_vulnerable_to(AdjacentBlast));
        assert!(ObstacleKind::Stone.is_vulnerable_to(Rocket));
        assert!(ObstacleKind::Vase.is_vulnerable_to(AdjacentBlast));
        assert!(ObstacleKind::Vase.is_vulnerable_to(Rocket));
    }

    #[test]
    fn test_vase_adjacent_damage_is_capped() {
        let mut vase = Obstacle::new(ObstacleKind::Vase);
        assert_eq!(
            vase.take_damage(DamageSource::AdjacentBlast, 5),
            Damage::Damaged { remaining: 1 }
        );
        assert_eq!(vase.take_damage(DamageSource::AdjacentBlast, 5), Damage::Destroyed);
        assert_eq!(vase.health(), 0);
    }

    #[test]
    fn test_vase_takes_full_rocket_damage() {
        let mut vase = Obstacle::new(ObstacleKind::Vase);
        assert_eq!(vase.take_damage(DamageSource::Rocket, 2), Damage::Destroyed);
    }

    #[test]
    fn test_health_never_underflows() {
        let mut vase = Obstacle::new(ObstacleKind::Vase);
        assert_eq!(vase.take_damage(DamageSource::Rocket, 200), Damage::Destroyed);
        assert_eq!(vase.health(), 0);
    }

    #[test]
    fn test_destruction_is_reported_once() {
        let mut obstacle = Obstacle::new(ObstacleKind::Box);
        assert_eq!(obstacle.take_damage(DamageSource::Rocket, 1), Damage::Destroyed);
        assert_eq!(obstacle.take_damage(DamageSource::Rocket, 1), Damage::Immune);
    }

    #[test]
    fn test_stone_ignores_adjacent_blast() {
        let mut grid = Grid::from_rows(&["s"]);
        let mut log = EventLog::new();
        let damage = damage_at(&mut grid, Pos::new(0, 0), DamageSource::AdjacentBlast, 1, &mut log);
        assert_eq!(damage, Damage::Immune);
        assert!(log.is_empty());
        assert_eq!(grid.to_rows(), vec!["s"]);

        let damage = damage_at(&mut grid, Pos::new(0, 0), DamageSource::Rocket, 1, &mut log);
        assert_eq!(damage, Damage::Destroyed);
        assert_eq!(grid.to_rows(), vec!["."]);
        // Second hit on the vacated cell is a no-op.
        let damage = damage_at(&mut grid, Pos::new(0, 0), DamageSource::Rocket, 1, &mut log);
        assert_eq!(damage, Damage::Immune);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_adjacent_blast_hits_each_neighbour_once() {
        // The vase borders all three removed cells.
        let mut grid = Grid::from_rows(&[
            ". . .",
            ". v .",
            ". . .",
        ]);
        let removed = [Pos::new(0, 1), Pos::new(1, 0), Pos::new(2, 1)];
        let mut log = EventLog::new();
        let hit = dispatch_adjacent_blast(&mut grid, &removed, &mut log);

        assert_eq!(hit.iter().filter(|&&p| p == Pos::new(1, 1)).count(), 1);
        let Some(Entity::Obstacle(vase)) = grid.get(Pos::new(1, 1)) else {
            panic!("vase should survive one blast");
        };
        assert_eq!(vase.health(), 1);
        assert_eq!(
            log.iter().collect::<Vec<_>>(),
            vec![&GridEvent::ObstacleDamaged {
                pos: Pos::new(1, 1),
                remaining_health: 1,
            }]
        );
    }

    #[test]
    fn test_adjacent_blast_destroys_box_and_spares_stone() {
        let mut grid = Grid::from_rows(&[
            "bo s",
            ". .",
        ]);
        let mut log = EventLog::new();
        dispatch_adjacent_blast(&mut grid, &[Pos::new(0, 0), Pos::new(1, 0)], &mut log);
        assert_eq!(grid.to_rows(), vec![". s", ". ."]);
    }
}
