//! Board state: cell occupancy, bounds-checked access and the tile-code view.

use crate::entity::Entity;
use crate::error::EngineError;
use crate::tile::{Layout, TileCode};
use rand::Rng;
use std::fmt;
use std::ops::Add;

/// Grid coordinate. `y` grows upward: row 0 is the bottom row.
///
/// Signed so neighbour probes may step off the board; such positions are simply
/// never `contained` by a [`Grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const UP: Self = Self::new(0, 1);
    pub const DOWN: Self = Self::new(0, -1);
    pub const LEFT: Self = Self::new(-1, 0);
    pub const RIGHT: Self = Self::new(1, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Four-directional neighbours in probe order: right, left, up, down.
    pub fn neighbors(self) -> [Self; 4] {
        [
            self + Self::RIGHT,
            self + Self::LEFT,
            self + Self::UP,
            self + Self::DOWN,
        ]
    }
}

impl Add for Pos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Pos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// The authoritative board. Each cell is empty or owns exactly one [`Entity`].
///
/// The tile-code view is derived from the occupant ([`Entity::tile_code`]), so the two
/// views always agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    /// cells[y * width + x]; row 0 is the bottom.
    cells: Vec<Option<Entity>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::EmptyGrid { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![None; width * height],
        })
    }

    /// Build a grid and populate it from a validated layout.
    pub fn from_layout(layout: &Layout, rng: &mut impl Rng) -> Result<Self, EngineError> {
        let mut grid = Self::new(layout.width(), layout.height())?;
        grid.sync(layout, rng);
        Ok(grid)
    }

    /// Fill empty cells from `layout`; occupied cells are left untouched.
    ///
    /// Random cubes are rolled here, once per populated cell, so repeated syncs are
    /// idempotent as long as `layout` tracks the board (see [`Layout::apply`]).
    /// Returns the number of entities created.
    pub fn sync(&mut self, layout: &Layout, rng: &mut impl Rng) -> usize {
        let mut created = 0;
        for pos in self.positions().collect::<Vec<_>>() {
            if !self.is_vacant(pos) {
                continue;
            }
            let Some(entity) = layout.code(pos).and_then(|code| code.instantiate(rng)) else {
                continue;
            };
            if self.place(pos, entity) {
                created += 1;
            }
        }
        log::debug!("grid sync created {created} entities");
        created
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    #[inline]
    fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos)
            .then(|| pos.y as usize * self.width + pos.x as usize)
    }

    /// Occupant at `pos`; `None` when empty or off the board.
    #[inline]
    pub fn get(&self, pos: Pos) -> Option<&Entity> {
        self.index(pos).and_then(|i| self.cells[i].as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut Entity> {
        self.index(pos).and_then(|i| self.cells[i].as_mut())
    }

    /// True for an in-bounds cell with no occupant.
    #[inline]
    pub fn is_vacant(&self, pos: Pos) -> bool {
        self.index(pos).is_some_and(|i| self.cells[i].is_none())
    }

    /// Put `entity` into a vacant cell. Occupied or off-board cells are left alone and
    /// `false` is returned.
    pub fn place(&mut self, pos: Pos, entity: Entity) -> bool {
        match self.index(pos) {
            Some(i) if self.cells[i].is_none() => {
                self.cells[i] = Some(entity);
                true
            }
            _ => false,
        }
    }

    /// Remove and return the occupant of `pos`.
    pub fn take(&mut self, pos: Pos) -> Option<Entity> {
        self.index(pos).and_then(|i| self.cells[i].take())
    }

    /// Relocate the occupant of `from` into the vacant cell `to`. Both views change in
    /// one step; nothing happens unless `from` is occupied and `to` is vacant.
    pub fn move_entity(&mut self, from: Pos, to: Pos) -> bool {
        if !self.is_vacant(to) {
            return false;
        }
        match self.take(from) {
            Some(entity) => self.place(to, entity),
            None => false,
        }
    }

    /// Tile code of a cell; off-board cells read as empty.
    pub fn tile_code(&self, pos: Pos) -> TileCode {
        self.get(pos).map_or(TileCode::Empty, Entity::tile_code)
    }

    /// Tile-code matrix, `rows[y][x]` with row 0 at the bottom.
    pub fn snapshot(&self) -> Vec<Vec<String>> {
        (0..self.height as i32)
            .map(|y| {
                (0..self.width as i32)
                    .map(|x| self.tile_code(Pos::new(x, y)).to_string())
                    .collect()
            })
            .collect()
    }

    /// Every position, row by row from the bottom, left to right.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |y| (0..w).map(move |x| Pos::new(x, y)))
    }

    /// Occupied cells with their entities, in [`Self::positions`] order.
    pub fn entities(&self) -> impl Iterator<Item = (Pos, &Entity)> {
        self.positions()
            .filter_map(move |pos| self.get(pos).map(|e| (pos, e)))
    }

    pub fn obstacles_remaining(&self) -> usize {
        self.entities().filter(|(_, e)| e.is_damageable()).count()
    }

    /// Build a grid from rows written top row first, codes separated by spaces.
    /// `.` is empty; `hro`/`vro` place rockets.
    #[cfg(test)]
    pub(crate) fn from_rows(rows: &[&str]) -> Self {
        use crate::entity::Direction;

        let height = rows.len();
        let width = rows[0].split_whitespace().count();
        let mut grid = Self::new(width, height).unwrap();
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        for (row, line) in rows.iter().enumerate() {
            let y = (height - 1 - row) as i32;
            for (x, token) in line.split_whitespace().enumerate() {
                let pos = Pos::new(x as i32, y);
                let entity = match token {
                    "." => None,
                    "hro" => Some(Entity::Rocket(Direction::Horizontal)),
                    "vro" => Some(Entity::Rocket(Direction::Vertical)),
                    code => code.parse::<TileCode>().unwrap().instantiate(&mut rng),
                };
                if let Some(entity) = entity {
                    grid.place(pos, entity);
                }
            }
        }
        grid
    }

    /// Inverse of [`Self::from_rows`].
    #[cfg(test)]
    pub(crate) fn to_rows(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .rev()
            .map(|row| {
                row.into_iter()
                    .map(|code| if code == "empty" { ".".to_string() } else { code })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Color;
    use test_log::test;

    #[test]
    fn test_new_rejects_zero_dimensions() {
        assert_eq!(
            Grid::new(0, 3),
            Err(EngineError::EmptyGrid { width: 0, height: 3 })
        );
    }

    #[test]
    fn test_out_of_bounds_access_is_a_no_op() {
        let mut grid = Grid::from_rows(&["r g", "b y"]);
        let outside = [Pos::new(-1, 0), Pos::new(0, -1), Pos::new(2, 0), Pos::new(0, 2)];
        for pos in outside {
            assert!(!grid.contains(pos));
            assert_eq!(grid.get(pos), None);
            assert_eq!(grid.take(pos), None);
            assert!(!grid.place(pos, Entity::Cube(Color::Red)));
            assert!(!grid.move_entity(Pos::new(0, 0), pos));
            assert_eq!(grid.tile_code(pos), TileCode::Empty);
        }
        assert_eq!(grid.to_rows(), vec!["r g", "b y"]);
    }

    #[test]
    fn test_rows_are_bottom_up() {
        let grid = Grid::from_rows(&["r .", "b y"]);
        assert_eq!(grid.get(Pos::new(0, 0)), Some(&Entity::Cube(Color::Blue)));
        assert_eq!(grid.get(Pos::new(0, 1)), Some(&Entity::Cube(Color::Red)));
        assert_eq!(
            grid.snapshot(),
            vec![vec!["b", "y"], vec!["r", "empty"]]
        );
    }

    #[test]
    fn test_place_never_overwrites() {
        let mut grid = Grid::from_rows(&["r"]);
        assert!(!grid.place(Pos::new(0, 0), Entity::Cube(Color::Green)));
        assert_eq!(grid.tile_code(Pos::new(0, 0)), TileCode::Cube(Color::Red));
    }

    #[test]
    fn test_move_requires_vacant_target() {
        let mut grid = Grid::from_rows(&["r", "g", "."]);
        assert!(!grid.move_entity(Pos::new(0, 2), Pos::new(0, 1)));
        assert!(grid.move_entity(Pos::new(0, 1), Pos::new(0, 0)));
        assert_eq!(grid.to_rows(), vec!["r", ".", "g"]);
        assert!(!grid.move_entity(Pos::new(0, 1), Pos::new(0, 1)));
    }

    #[test]
    fn test_obstacles_remaining_counts_damageables() {
        let grid = Grid::from_rows(&["bo s v", "r hro ."]);
        assert_eq!(grid.obstacles_remaining(), 3);
    }
}
