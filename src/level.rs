//! Level files: JSON level descriptions and the bundled first level.

use crate::error::EngineError;
use crate::tile::Layout;
use crate::turn::Engine;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUILTIN_LEVEL: &str = include_str!("../levels/level_1.json");

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed level data")]
    Parse(#[from] serde_json::Error),
    #[error("invalid level grid")]
    Grid(#[from] EngineError),
}

/// One level as stored on disk.
///
/// `grid` lists tile codes row by row starting from the bottom row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelData {
    pub level_number: u32,
    pub grid_width: usize,
    pub grid_height: usize,
    /// Moves allowed; absent means unlimited.
    #[serde(default)]
    pub move_count: Option<u32>,
    pub grid: Vec<String>,
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let json = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let level = Self::from_json(&json)?;
        log::info!(
            "loaded level {} ({}x{}) from {}",
            level.level_number,
            level.grid_width,
            level.grid_height,
            path.display()
        );
        Ok(level)
    }

    /// The level shipped inside the binary.
    pub fn builtin() -> Result<Self, LevelError> {
        Self::from_json(BUILTIN_LEVEL)
    }

    pub fn layout(&self) -> Result<Layout, EngineError> {
        Layout::parse(self.grid_width, self.grid_height, &self.grid)
    }

    /// Build a ready engine. `moves` overrides the file's move count when given.
    pub fn engine(&self, seed: Option<u64>, moves: Option<u32>) -> Result<Engine, LevelError> {
        let engine = Engine::from_layout(&self.layout()?, seed)?;
        Ok(engine.with_move_budget(moves.or(self.move_count)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Pos;
    use crate::tile::TileCode;
    use test_log::test;

    #[test]
    fn test_builtin_level_loads() {
        let level = LevelData::builtin().unwrap();
        assert_eq!(level.level_number, 1);
        let engine = level.engine(Some(3), None).unwrap();
        assert_eq!(engine.grid().width(), level.grid_width);
        assert_eq!(engine.moves_left(), level.move_count);
        assert!(engine.grid().obstacles_remaining() > 0);
    }

    #[test]
    fn test_move_count_is_optional_and_overridable() {
        let level = LevelData::from_json(
            r#"{"level_number": 4, "grid_width": 2, "grid_height": 1, "grid": ["r", "v"]}"#,
        )
        .unwrap();
        assert_eq!(level.move_count, None);
        assert_eq!(level.engine(Some(1), None).unwrap().moves_left(), None);
        assert_eq!(level.engine(Some(1), Some(7)).unwrap().moves_left(), Some(7));
        assert_eq!(
            level.layout().unwrap().code(Pos::new(1, 0)),
            Some(TileCode::Obstacle(crate::obstacle::ObstacleKind::Vase))
        );
    }

    #[test]
    fn test_bad_grid_is_reported() {
        let level = LevelData::from_json(
            r#"{"level_number": 1, "grid_width": 2, "grid_height": 1, "grid": ["r", "hro"]}"#,
        )
        .unwrap();
        assert!(matches!(
            level.engine(None, None),
            Err(LevelError::Grid(EngineError::InvalidTileCode { .. }))
        ));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            LevelData::from_json("{\"level_number\": 1"),
            Err(LevelError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_keeps_path() {
        let err = LevelData::load(Path::new("no/such/level.json")).unwrap_err();
        assert!(err.to_string().contains("no/such/level.json"));
    }
}
