//! Same-colour group search and the rocket-eligibility rule.

use crate::entity::{Color, Entity};
use crate::grid::{Grid, Pos};
use std::collections::{HashSet, VecDeque};

/// Smallest group a selection may remove.
pub const MIN_GROUP_SIZE: usize = 2;
/// Groups at least this large turn into a rocket instead of being removed.
pub const ROCKET_GROUP_SIZE: usize = 4;

/// Connected same-colour cubes around a selected cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    /// Breadth-first order from the origin; the origin comes first.
    positions: Vec<Pos>,
    color: Option<Color>,
}

impl Group {
    pub fn positions(&self) -> &[Pos] {
        &self.positions
    }

    pub fn origin(&self) -> Option<Pos> {
        self.positions.first().copied()
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.positions.contains(&pos)
    }

    /// Large enough for the player to act on.
    pub fn is_actionable(&self) -> bool {
        self.len() >= MIN_GROUP_SIZE
    }

    pub fn rocket_eligible(&self) -> bool {
        self.len() >= ROCKET_GROUP_SIZE
    }
}

/// Flood fill over 4-neighbours from `origin`, keeping cubes of the origin's colour.
///
/// Returns an empty group when `origin` is empty, off the board or not a cube.
pub fn find_group(grid: &Grid, origin: Pos) -> Group {
    let Some(Entity::Cube(color)) = grid.get(origin) else {
        return Group::default();
    };
    let color = *color;

    let mut positions = Vec::new();
    let mut visited = HashSet::from([origin]);
    let mut queue = VecDeque::from([origin]);

    while let Some(pos) = queue.pop_front() {
        positions.push(pos);
        for neighbor in pos.neighbors() {
            if visited.contains(&neighbor) {
                continue;
            }
            if grid.get(neighbor).and_then(Entity::color) == Some(color) {
                visited.insert(neighbor);
                queue.push_back(neighbor);
            }
        }
    }

    log::trace!("group at {origin}: {} {:?} cubes", positions.len(), color);
    Group {
        positions,
        color: Some(color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn sorted(group: &Group) -> Vec<Pos> {
        let mut v = group.positions().to_vec();
        v.sort();
        v
    }

    #[test]
    fn test_non_cube_origin_yields_empty_group() {
        let grid = Grid::from_rows(&["r bo .", "hro r r"]);
        for pos in [Pos::new(1, 1), Pos::new(2, 1), Pos::new(0, 0), Pos::new(9, 9)] {
            let group = find_group(&grid, pos);
            assert!(group.is_empty());
            assert!(!group.is_actionable());
            assert_eq!(group.color(), None);
        }
    }

    #[test]
    fn test_group_is_four_connected_only() {
        let grid = Grid::from_rows(&[
            "r g r",
            "g r g",
            "r g r",
        ]);
        // Diagonal neighbours do not join the centre.
        let group = find_group(&grid, Pos::new(1, 1));
        assert_eq!(group.positions(), &[Pos::new(1, 1)]);
        assert!(!group.is_actionable());
    }

    #[test]
    fn test_group_stops_at_other_colours_and_obstacles() {
        let grid = Grid::from_rows(&[
            "b b s b",
            "b g g b",
            "b b b bo",
        ]);
        let group = find_group(&grid, Pos::new(0, 0));
        assert_eq!(
            sorted(&group),
            vec![
                Pos::new(0, 0),
                Pos::new(0, 1),
                Pos::new(0, 2),
                Pos::new(1, 0),
                Pos::new(1, 2),
                Pos::new(2, 0),
            ]
        );
        assert_eq!(group.color(), Some(Color::Blue));
        assert!(group.positions().iter().all(|&p| grid.get(p) == Some(&Entity::Cube(Color::Blue))));
    }

    #[test]
    fn test_enumeration_is_breadth_first_from_origin() {
        let grid = Grid::from_rows(&["y y y y"]);
        let group = find_group(&grid, Pos::new(1, 0));
        assert_eq!(
            group.positions(),
            &[Pos::new(1, 0), Pos::new(2, 0), Pos::new(0, 0), Pos::new(3, 0)]
        );
        assert_eq!(group.origin(), Some(Pos::new(1, 0)));
    }

    #[test]
    fn test_no_cell_visited_twice() {
        let grid = Grid::from_rows(&[
            "g g g",
            "g g g",
            "g g g",
        ]);
        let group = find_group(&grid, Pos::new(1, 1));
        let unique: HashSet<_> = group.positions().iter().collect();
        assert_eq!(unique.len(), group.len());
        assert_eq!(group.len(), 9);
    }

    #[test]
    fn test_rocket_threshold_boundary() {
        let three = find_group(&Grid::from_rows(&["r r r g"]), Pos::new(0, 0));
        assert_eq!(three.len(), 3);
        assert!(three.is_actionable());
        assert!(!three.rocket_eligible());

        let four = find_group(&Grid::from_rows(&["r r r r"]), Pos::new(0, 0));
        assert_eq!(four.len(), 4);
        assert!(four.rocket_eligible());
    }
}
