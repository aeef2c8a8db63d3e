use std::collections::HashSet;
use std::fmt;

/// Wall material of one map cell. `0` is empty floor, `1..=9` are walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileId(u8);

impl TileId {
    pub const EMPTY: TileId = TileId(0);
    pub const MAX: u8 = 9;

    pub fn new(id: u8) -> Option<Self> {
        (id <= Self::MAX).then_some(Self(id))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Integer grid coordinate, (0, 0) is the bottom-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Width or height is zero.
    EmptyMap,
    /// Tile vector length does not match width * height.
    TileCountMismatch { expected: usize, actual: usize },
    /// A row has a different length than the first one.
    RaggedRows { row: usize, expected: usize, actual: usize },
    /// Tile id outside 0..=9.
    InvalidTile { x: usize, y: usize, id: u8 },
    /// Character the ASCII map format does not know.
    UnknownGlyph { line: usize, column: usize, glyph: char },
    MonsterOutOfBounds { x: usize, y: usize },
    OutOfBounds { x: usize, y: usize },
    /// The ASCII map has no `s` marker.
    MissingStart,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMap => write!(f, "map must have a positive width and height"),
            Self::TileCountMismatch { expected, actual } => {
                write!(f, "expected {expected} tiles, got {actual}")
            }
            Self::RaggedRows { row, expected, actual } => {
                write!(f, "row {row} has {actual} cells, expected {expected}")
            }
            Self::InvalidTile { x, y, id } => {
                write!(f, "tile id {id} at ({x}, {y}) is outside 0..={}", TileId::MAX)
            }
            Self::UnknownGlyph { line, column, glyph } => {
                write!(f, "unknown map glyph {glyph:?} at line {line}, column {column}")
            }
            Self::MonsterOutOfBounds { x, y } => write!(f, "monster at ({x}, {y}) is outside the map"),
            Self::OutOfBounds { x, y } => write!(f, "cell ({x}, {y}) is outside the map"),
            Self::MissingStart => write!(f, "map has no player start marker 's'"),
        }
    }
}

impl std::error::Error for MapError {}

/// Static tile grid plus monster positions. Never changes after construction.
#[derive(Debug, Clone)]
pub struct WorldMap {
    width: usize,
    height: usize,
    tiles: Vec<TileId>, // row-major, row 0 at the bottom
    monsters: HashSet<Cell>,
}

/// Result of parsing an ASCII map.
#[derive(Debug, Clone)]
pub struct MapLayout {
    pub map: WorldMap,
    pub start: Option<Cell>,
}

impl WorldMap {
    pub fn new(
        width: usize,
        height: usize,
        tiles: Vec<u8>,
        monsters: impl IntoIterator<Item = Cell>,
    ) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::EmptyMap);
        }
        let expected = width * height;
        if tiles.len() != expected {
            return Err(MapError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }

        let tiles = tiles
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                TileId::new(id).ok_or(MapError::InvalidTile {
                    x: i % width,
                    y: i / width,
                    id,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut set = HashSet::new();
        for cell in monsters {
            if cell.x >= width || cell.y >= height {
                return Err(MapError::MonsterOutOfBounds { x: cell.x, y: cell.y });
            }
            set.insert(cell);
        }

        Ok(Self {
            width,
            height,
            tiles,
            monsters: set,
        })
    }

    /// Builds a map from rows of tile ids, bottom row (y = 0) first.
    pub fn from_rows<R: AsRef<[u8]>>(
        rows: &[R],
        monsters: impl IntoIterator<Item = Cell>,
    ) -> Result<Self, MapError> {
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row, cells) in rows.iter().enumerate() {
            let cells = cells.as_ref();
            if cells.len() != width {
                return Err(MapError::RaggedRows {
                    row,
                    expected: width,
                    actual: cells.len(),
                });
            }
            tiles.extend_from_slice(cells);
        }
        Self::new(width, rows.len(), tiles, monsters)
    }

    /// Parses the ASCII map format. Lines are written top row first so the
    /// text looks like the minimap; they are flipped so (0, 0) is bottom-left.
    ///
    /// `0`-`9` tile ids, `.` or space empty, `s` player start,
    /// `g` `h` `t` `m` monsters.
    pub fn parse(text: &str) -> Result<MapLayout, MapError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty())
            .collect();

        let height = lines.len();
        let mut rows: Vec<Vec<u8>> = Vec::with_capacity(height);
        let mut monsters = Vec::new();
        let mut start = None;

        for (line_no, line) in lines.iter().enumerate() {
            let y = height - 1 - line_no;
            let mut row = Vec::with_capacity(line.len());
            for (x, glyph) in line.chars().enumerate() {
                let id = match glyph {
                    '0'..='9' => glyph as u8 - b'0',
                    '.' | ' ' => 0,
                    's' => {
                        start = Some(Cell::new(x, y));
                        0
                    }
                    'g' | 'h' | 't' | 'm' => {
                        monsters.push(Cell::new(x, y));
                        0
                    }
                    _ => {
                        return Err(MapError::UnknownGlyph {
                            line: line_no + 1,
                            column: x + 1,
                            glyph,
                        });
                    }
                };
                row.push(id);
            }
            rows.push(row);
        }
        rows.reverse();

        let map = Self::from_rows(&rows, monsters)?;
        Ok(MapLayout { map, start })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn wall(&self, x: usize, y: usize) -> Result<TileId, MapError> {
        if x >= self.width || y >= self.height {
            return Err(MapError::OutOfBounds { x, y });
        }
        Ok(self.tiles[y * self.width + x])
    }

    pub fn is_walkable(&self, x: usize, y: usize) -> Result<bool, MapError> {
        self.wall(x, y).map(TileId::is_empty)
    }

    #[inline]
    pub fn monster_at(&self, x: usize, y: usize) -> bool {
        self.monsters.contains(&Cell::new(x, y))
    }

    /// Monster cells in row-major order.
    pub fn monsters(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.monsters.iter().copied().collect();
        cells.sort_by_key(|c| (c.y, c.x));
        cells
    }

    /// Bounds-checked lookup with signed coordinates; `None` outside the grid.
    #[inline]
    pub fn tile_at(&self, x: i64, y: i64) -> Option<TileId> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.tiles[y as usize * self.width + x as usize])
    }

    /// Out-of-map cells count as solid.
    #[inline]
    pub fn is_solid_at(&self, x: i64, y: i64) -> bool {
        self.tile_at(x, y).is_none_or(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bordered(w: usize, h: usize) -> WorldMap {
        let mut tiles = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    tiles[y * w + x] = 1;
                }
            }
        }
        WorldMap::new(w, h, tiles, []).unwrap()
    }

    #[test]
    fn wall_round_trip() {
        let tiles: Vec<u8> = (0..12).map(|i| (i % 10) as u8).collect();
        let map = WorldMap::new(4, 3, tiles.clone(), []).unwrap();
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(map.wall(x, y).unwrap().get(), tiles[y * 4 + x]);
            }
        }
    }

    #[test]
    fn out_of_bounds_is_reported() {
        let map = bordered(5, 5);
        assert_eq!(map.wall(5, 0), Err(MapError::OutOfBounds { x: 5, y: 0 }));
        assert_eq!(map.is_walkable(0, 7), Err(MapError::OutOfBounds { x: 0, y: 7 }));
        assert_eq!(map.tile_at(-1, 2), None);
        assert!(map.is_solid_at(-1, 2));
    }

    #[test]
    fn walkable_matches_empty_tile() {
        let map = bordered(5, 5);
        assert_eq!(map.is_walkable(2, 2), Ok(true));
        assert_eq!(map.is_walkable(0, 2), Ok(false));
    }

    #[test]
    fn construction_rejects_bad_input() {
        assert_eq!(WorldMap::new(0, 3, vec![], []).unwrap_err(), MapError::EmptyMap);
        assert_eq!(
            WorldMap::new(2, 2, vec![0; 3], []).unwrap_err(),
            MapError::TileCountMismatch { expected: 4, actual: 3 }
        );
        assert_eq!(
            WorldMap::new(2, 1, vec![0, 12], []).unwrap_err(),
            MapError::InvalidTile { x: 1, y: 0, id: 12 }
        );
        assert_eq!(
            WorldMap::new(2, 2, vec![0; 4], [Cell::new(2, 0)]).unwrap_err(),
            MapError::MonsterOutOfBounds { x: 2, y: 0 }
        );
        assert!(matches!(
            WorldMap::from_rows(&[vec![0u8, 0], vec![0]], []),
            Err(MapError::RaggedRows { row: 1, .. })
        ));
    }

    #[test]
    fn monsters_are_looked_up() {
        let map = WorldMap::new(3, 3, vec![0; 9], [Cell::new(1, 2), Cell::new(0, 0)]).unwrap();
        assert!(map.monster_at(1, 2));
        assert!(!map.monster_at(2, 1));
        assert_eq!(map.monsters(), vec![Cell::new(0, 0), Cell::new(1, 2)]);
    }

    #[test]
    fn parse_flips_rows() {
        let layout = WorldMap::parse(
            "1111\n\
             1g.1\n\
             1s21\n\
             1111\n",
        )
        .unwrap();
        let map = &layout.map;
        assert_eq!((map.width(), map.height()), (4, 4));
        assert_eq!(layout.start, Some(Cell::new(1, 1)));
        assert!(map.monster_at(1, 2));
        assert_eq!(map.wall(2, 1).unwrap().get(), 2);
        assert_eq!(map.wall(2, 2).unwrap(), TileId::EMPTY);
    }

    #[test]
    fn parse_rejects_unknown_glyph() {
        let err = WorldMap::parse("111\n1x1\n111").unwrap_err();
        assert_eq!(
            err,
            MapError::UnknownGlyph {
                line: 2,
                column: 2,
                glyph: 'x'
            }
        );
    }
}
