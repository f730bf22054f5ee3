//! Column compaction after removals.

use crate::event::{EventLog, FALL_HINT, GridEvent};
use crate::grid::{Grid, Pos};

/// One entity relocation produced by [`compact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub from: Pos,
    pub to: Pos,
}

/// Drop every fallable entity onto the lowest empty cell beneath it.
///
/// Columns go left to right, each scanned from the bottom. Non-fallable occupants
/// (boxes, stones, rockets) anchor the column: nothing passes through them, and
/// collection restarts above them. Falls are reported in discovery order.
pub fn compact(grid: &mut Grid, log: &mut EventLog) -> Vec<Fall> {
    let mut falls = Vec::new();
    for x in 0..grid.width() as i32 {
        let mut collect: Option<i32> = None;
        for y in 0..grid.height() as i32 {
            let pos = Pos::new(x, y);
            let Some(entity) = grid.get(pos) else {
                if collect.is_none() {
                    collect = Some(y);
                }
                continue;
            };
            if !entity.is_fallable() {
                collect = None;
                continue;
            }
            let Some(target) = collect else {
                continue;
            };
            let to = Pos::new(x, target);
            if grid.move_entity(pos, to) {
                log.push_timed(GridEvent::EntityMoved { from: pos, to }, FALL_HINT);
                falls.push(Fall { from: pos, to });
                collect = Some(target + 1);
            }
        }
    }
    if !falls.is_empty() {
        log::debug!("compaction moved {} entities", falls.len());
    }
    falls
}

/// True when no fallable entity rests directly above an empty cell.
pub fn is_settled(grid: &Grid) -> bool {
    grid.entities().all(|(pos, entity)| {
        !entity.is_fallable() || pos.y == 0 || !grid.is_vacant(pos + Pos::DOWN)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_cubes_drop_over_box() {
        // Bottom-up column: box, red, empty, red.
        let mut grid = Grid::from_rows(&["r", ".", "r", "bo"]);
        let mut log = EventLog::new();
        let falls = compact(&mut grid, &mut log);
        assert_eq!(
            falls,
            vec![Fall {
                from: Pos::new(0, 3),
                to: Pos::new(0, 2),
            }]
        );
        assert_eq!(grid.to_rows(), vec![".", "r", "r", "bo"]);
        assert!(is_settled(&grid));
    }

    #[test]
    fn test_multiple_gaps_collapse_in_order() {
        let mut grid = Grid::from_rows(&["g", "v", ".", "b", ".", "."]);
        let mut log = EventLog::new();
        let falls = compact(&mut grid, &mut log);
        assert_eq!(
            falls,
            vec![
                Fall {
                    from: Pos::new(0, 2),
                    to: Pos::new(0, 0),
                },
                Fall {
                    from: Pos::new(0, 4),
                    to: Pos::new(0, 1),
                },
                Fall {
                    from: Pos::new(0, 5),
                    to: Pos::new(0, 2),
                },
            ]
        );
        assert_eq!(grid.to_rows(), vec![".", ".", ".", "g", "v", "b"]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.total_hint(), FALL_HINT * 3);
    }

    #[test]
    fn test_anchors_hold_their_column() {
        let mut grid = Grid::from_rows(&[
            "r y b",
            ". . .",
            "s bo vro",
            ". . .",
        ]);
        let mut log = EventLog::new();
        compact(&mut grid, &mut log);
        assert_eq!(
            grid.to_rows(),
            vec![". . .", "r y b", "s bo vro", ". . ."]
        );
        assert!(is_settled(&grid));
    }

    #[test]
    fn test_rocket_stays_where_created() {
        let mut grid = Grid::from_rows(&["hro", "."]);
        let mut log = EventLog::new();
        assert!(compact(&mut grid, &mut log).is_empty());
        assert_eq!(grid.to_rows(), vec!["hro", "."]);
    }

    #[test]
    fn test_compaction_settles_every_column() {
        let mut grid = Grid::from_rows(&[
            "r g b y",
            ". v . g",
            "b . . .",
            ". r s .",
        ]);
        let mut log = EventLog::new();
        compact(&mut grid, &mut log);
        assert!(is_settled(&grid));
        assert!(compact(&mut grid, &mut log).is_empty());
        assert_eq!(grid.obstacles_remaining(), 2);
    }
}
