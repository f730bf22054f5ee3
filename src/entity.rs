//! Grid entities: cubes, obstacles and rockets, with their capability predicates.

use crate::grid::Pos;
use crate::obstacle::Obstacle;
use crate::tile::TileCode;
use rand::Rng;

/// Cube colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    pub const ALL: [Self; 4] = [Self::Red, Self::Green, Self::Blue, Self::Yellow];

    /// Uniformly random colour.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Palette index 0..4, in [`Self::ALL`] order.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Sweep axis of a rocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn random(rng: &mut impl Rng) -> Self {
        if rng.gen_bool(0.5) {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }

    /// The two unit steps a single rocket sweeps along.
    pub fn sweep_steps(self) -> [Pos; 2] {
        match self {
            Self::Horizontal => [Pos::LEFT, Pos::RIGHT],
            Self::Vertical => [Pos::UP, Pos::DOWN],
        }
    }
}

/// Anything that can occupy a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Cube(Color),
    Obstacle(Obstacle),
    Rocket(Direction),
}

impl Entity {
    /// Takes part in same-colour groups.
    pub fn is_matchable(&self) -> bool {
        matches!(self, Self::Cube(_))
    }

    pub fn is_damageable(&self) -> bool {
        matches!(self, Self::Obstacle(_))
    }

    /// Drops into empty cells below it during compaction. Rockets stay where they were
    /// created.
    pub fn is_fallable(&self) -> bool {
        match self {
            Self::Cube(_) => true,
            Self::Obstacle(obstacle) => obstacle.kind().can_fall(),
            Self::Rocket(_) => false,
        }
    }

    pub fn is_explodable(&self) -> bool {
        matches!(self, Self::Rocket(_))
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            Self::Cube(color) => Some(*color),
            _ => None,
        }
    }

    pub fn tile_code(&self) -> TileCode {
        match self {
            Self::Cube(color) => TileCode::Cube(*color),
            Self::Obstacle(obstacle) => TileCode::Obstacle(obstacle.kind()),
            Self::Rocket(direction) => TileCode::Rocket(*direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::ObstacleKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use test_log::test;

    #[test]
    fn test_capabilities() {
        let cube = Entity::Cube(Color::Blue);
        let vase = Entity::Obstacle(Obstacle::new(ObstacleKind::Vase));
        let stone = Entity::Obstacle(Obstacle::new(ObstacleKind::Stone));
        let rocket = Entity::Rocket(Direction::Vertical);

        assert!(cube.is_matchable() && cube.is_fallable() && !cube.is_damageable());
        assert!(vase.is_damageable() && vase.is_fallable() && !vase.is_matchable());
        assert!(stone.is_damageable() && !stone.is_fallable());
        assert!(rocket.is_explodable() && !rocket.is_fallable() && !rocket.is_matchable());
    }

    #[test]
    fn test_random_direction_covers_both_axes() {
        let mut rng = StdRng::seed_from_u64(7);
        let rolls: Vec<_> = (0..64).map(|_| Direction::random(&mut rng)).collect();
        assert!(rolls.contains(&Direction::Horizontal));
        assert!(rolls.contains(&Direction::Vertical));
    }
}
