//! Board model: tiles, positions, the square grid, adjacency and swapping.

use crate::error::ParseBoardError;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Side length of the reference board.
pub const BOARD_SIZE: usize = 8;
pub const MIN_BOARD_SIZE: usize = 3;
pub const MAX_BOARD_SIZE: usize = 32;
/// Shortest run that counts as a match.
pub const MATCH_MIN: usize = 3;
/// Countdown tiles start at this value.
pub const COUNTDOWN_START: u8 = 3;

/// Tile colour. The five matchable colours plus the immovable countdown ("grey") tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileKind {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Countdown,
}

impl TileKind {
    pub const MATCHABLE: [Self; 5] = [Self::Red, Self::Blue, Self::Green, Self::Yellow, Self::Purple];

    pub fn is_countdown(self) -> bool {
        self == Self::Countdown
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Countdown => "grey",
        }
    }

    /// Index into colour tables (0..6), same order as the enum.
    pub fn index(self) -> usize {
        self as usize
    }

    fn glyph(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Blue => 'B',
            Self::Green => 'G',
            Self::Yellow => 'Y',
            Self::Purple => 'P',
            Self::Countdown => '#',
        }
    }

    fn from_glyph(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(Self::Red),
            'B' => Some(Self::Blue),
            'G' => Some(Self::Green),
            'Y' => Some(Self::Yellow),
            'P' => Some(Self::Purple),
            _ => None,
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grid coordinate; row 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: Self) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    pub fn chebyshev(self, other: Self) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// Orthogonal neighbours that lie inside a `size` x `size` grid.
    pub fn neighbours(self, size: usize) -> impl Iterator<Item = Self> {
        const DIRS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        DIRS.into_iter().filter_map(move |(dr, dc)| {
            let row = self.row.checked_add_signed(dr)?;
            let col = self.col.checked_add_signed(dc)?;
            (row < size && col < size).then_some(Self { row, col })
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One-shot effect carried by a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Special {
    /// Clears a 5x5 block around itself, chaining into other bombs.
    Bomb,
    /// Clears every tile of its colour.
    Bolt,
}

pub type TileId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    pub position: Position,
    pub selected: bool,
    /// Pending removal at the next refill.
    pub matched: bool,
    /// Only set for countdown tiles.
    pub countdown: Option<u8>,
    pub special: Option<Special>,
    /// Colour of the resolution (bolt, line capture or blast) that consumed this tile.
    pub highlight: Option<TileKind>,
}

impl Tile {
    pub fn new(id: TileId, kind: TileKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            selected: false,
            matched: false,
            countdown: kind.is_countdown().then_some(COUNTDOWN_START),
            special: None,
            highlight: None,
        }
    }

    pub fn with_special(mut self, special: Special) -> Self {
        self.special = Some(special);
        self
    }

    pub fn is_bomb(&self) -> bool {
        self.special == Some(Special::Bomb)
    }

    pub fn is_bolt(&self) -> bool {
        self.special == Some(Special::Bolt)
    }
}

/// Square grid of tiles stored row-major. Every cell always holds a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Tile>,
}

impl Board {
    /// Build a board by asking `make` for the tile at every position (row-major order).
    /// The tile's `position` is overwritten with its cell coordinate.
    pub fn from_fn(size: usize, mut make: impl FnMut(Position) -> Tile) -> Self {
        let cells = (0..size * size)
            .map(|i| {
                let pos = Position::new(i / size, i % size);
                let mut tile = make(pos);
                tile.position = pos;
                tile
            })
            .collect();
        Self { size, cells }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    #[inline]
    fn idx(&self, pos: Position) -> usize {
        pos.row * self.size + pos.col
    }

    pub fn get(&self, pos: Position) -> Option<&Tile> {
        self.contains(pos).then(|| &self.cells[self.idx(pos)])
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if self.contains(pos) {
            let i = self.idx(pos);
            Some(&mut self.cells[i])
        } else {
            None
        }
    }

    /// Replace the tile at `pos`, fixing its `position`.
    pub fn set(&mut self, pos: Position, mut tile: Tile) {
        if let Some(cell) = self.get_mut(pos) {
            tile.position = pos;
            *cell = tile;
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let size = self.size;
        (0..size * size).map(move |i| Position::new(i / size, i % size))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter()
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.cells.iter_mut()
    }

    pub fn row(&self, row: usize) -> impl Iterator<Item = Position> + use<> {
        let size = self.size;
        (0..size).map(move |col| Position::new(row, col))
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = Position> + use<> {
        let size = self.size;
        (0..size).map(move |row| Position::new(row, col))
    }

    /// Orthogonally adjacent and neither tile is a countdown tile.
    pub fn are_adjacent(&self, a: Position, b: Position) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(ta), Some(tb)) => {
                a.manhattan(b) == 1 && !ta.kind.is_countdown() && !tb.kind.is_countdown()
            }
            _ => false,
        }
    }

    /// New board with the tiles at `a` and `b` exchanged; `self` is untouched.
    pub fn swapped(&self, a: Position, b: Position) -> Self {
        let mut next = self.clone();
        if self.contains(a) && self.contains(b) {
            let (ia, ib) = (self.idx(a), self.idx(b));
            next.cells.swap(ia, ib);
            next.cells[ia].position = a;
            next.cells[ib].position = b;
        }
        next
    }

    pub fn selected(&self) -> Option<Position> {
        self.cells.iter().find(|t| t.selected).map(|t| t.position)
    }

    pub fn clear_selection(&mut self) {
        for tile in &mut self.cells {
            tile.selected = false;
        }
    }

    pub fn matched_count(&self) -> usize {
        self.cells.iter().filter(|t| t.matched).count()
    }

    /// Same layout ignoring tile identity and selection.
    pub fn same_layout(&self, other: &Self) -> bool {
        self.size == other.size
            && self.cells.iter().zip(&other.cells).all(|(a, b)| {
                a.kind == b.kind
                    && a.position == b.position
                    && a.countdown == b.countdown
                    && a.special == b.special
                    && a.matched == b.matched
            })
    }
}

impl Index<Position> for Board {
    type Output = Tile;

    fn index(&self, pos: Position) -> &Tile {
        &self.cells[self.idx(pos)]
    }
}

impl IndexMut<Position> for Board {
    fn index_mut(&mut self, pos: Position) -> &mut Tile {
        let i = self.idx(pos);
        &mut self.cells[i]
    }
}

/// Text layout, one row per line: `R B G Y P` colours (lowercase = bomb),
/// `#` countdown at 3, digits `1`..=`9` countdown at that value.
/// Whitespace inside a row is ignored.
impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<Vec<char>> = s
            .lines()
            .map(|l| l.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>())
            .filter(|r| !r.is_empty())
            .collect();
        let size = rows.first().map(Vec::len).ok_or(ParseBoardError::Empty)?;
        for (row, glyphs) in rows.iter().enumerate() {
            if glyphs.len() != size {
                return Err(ParseBoardError::RaggedRow {
                    row,
                    found: glyphs.len(),
                    expected: size,
                });
            }
        }
        if rows.len() != size {
            return Err(ParseBoardError::NotSquare {
                rows: rows.len(),
                cols: size,
            });
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, glyphs) in rows.iter().enumerate() {
            for (col, &glyph) in glyphs.iter().enumerate() {
                let pos = Position::new(row, col);
                let id = (row * size + col) as TileId;
                let tile = match glyph {
                    '#' => Tile::new(id, TileKind::Countdown, pos),
                    '1'..='9' => {
                        let mut t = Tile::new(id, TileKind::Countdown, pos);
                        t.countdown = glyph.to_digit(10).map(|d| d as u8);
                        t
                    }
                    _ => {
                        let kind = TileKind::from_glyph(glyph)
                            .ok_or(ParseBoardError::UnknownGlyph { glyph, row, col })?;
                        let t = Tile::new(id, kind, pos);
                        if glyph.is_ascii_lowercase() {
                            t.with_special(Special::Bomb)
                        } else {
                            t
                        }
                    }
                };
                cells.push(tile);
            }
        }
        Ok(Self { size, cells })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for pos in self.row(row) {
                let tile = &self[pos];
                let glyph = match (tile.kind, tile.special) {
                    (TileKind::Countdown, _) => tile
                        .countdown
                        .and_then(|n| char::from_digit(u32::from(n), 10))
                        .unwrap_or('#'),
                    (kind, Some(Special::Bomb)) => kind.glyph().to_ascii_lowercase(),
                    (kind, _) => kind.glyph(),
                };
                let mark = if tile.matched { '*' } else { ' ' };
                write!(f, "{glyph}{mark}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().expect("valid layout")
    }

    #[test]
    fn test_parse_square_layout() {
        let b = board("RGB\nYP#\nrB2");
        assert_eq!(b.size(), 3);
        assert_eq!(b[Position::new(0, 1)].kind, TileKind::Green);
        assert_eq!(b[Position::new(1, 2)].countdown, Some(COUNTDOWN_START));
        assert!(b[Position::new(2, 0)].is_bomb());
        assert_eq!(b[Position::new(2, 2)].countdown, Some(2));
        for pos in b.positions() {
            assert_eq!(b[pos].position, pos);
        }
    }

    #[test]
    fn test_parse_rejects_ragged_and_unknown() {
        assert_eq!(
            "RG\nR".parse::<Board>(),
            Err(ParseBoardError::RaggedRow { row: 1, found: 1, expected: 2 })
        );
        assert_eq!(
            "RGB\nRGB".parse::<Board>(),
            Err(ParseBoardError::NotSquare { rows: 2, cols: 3 })
        );
        assert!(matches!(
            "RX\nRG".parse::<Board>(),
            Err(ParseBoardError::UnknownGlyph { glyph: 'X', row: 0, col: 1 })
        ));
        assert_eq!("\n \n".parse::<Board>(), Err(ParseBoardError::Empty));
    }

    #[test]
    fn test_adjacency_requires_distance_one() {
        let b = board("RGB\nYPB\nRGB");
        assert!(b.are_adjacent(Position::new(0, 0), Position::new(0, 1)));
        assert!(b.are_adjacent(Position::new(1, 1), Position::new(2, 1)));
        assert!(!b.are_adjacent(Position::new(0, 0), Position::new(1, 1)));
        assert!(!b.are_adjacent(Position::new(0, 0), Position::new(0, 2)));
        assert!(!b.are_adjacent(Position::new(0, 0), Position::new(0, 0)));
        assert!(!b.are_adjacent(Position::new(2, 2), Position::new(2, 3)));
    }

    #[test]
    fn test_countdown_tiles_are_not_swappable() {
        let b = board("R#B\nYPB\nRGB");
        assert!(!b.are_adjacent(Position::new(0, 0), Position::new(0, 1)));
        assert!(!b.are_adjacent(Position::new(1, 1), Position::new(0, 1)));
    }

    #[test]
    fn test_swap_updates_positions_and_keeps_input() {
        let b = board("RGB\nYPB\nRGB");
        let a = Position::new(0, 0);
        let c = Position::new(0, 1);
        let s = b.swapped(a, c);
        assert_eq!(s[a].kind, TileKind::Green);
        assert_eq!(s[c].kind, TileKind::Red);
        assert_eq!(s[a].position, a);
        assert_eq!(s[c].position, c);
        assert_eq!(s[a].id, b[c].id);
        assert_eq!(b[a].kind, TileKind::Red);
        assert!(s.swapped(a, c).same_layout(&b));
    }

    #[test]
    fn test_neighbours_clip_to_grid() {
        let corner: Vec<_> = Position::new(0, 0).neighbours(3).collect();
        assert_eq!(corner, vec![Position::new(1, 0), Position::new(0, 1)]);
        assert_eq!(Position::new(1, 1).neighbours(3).count(), 4);
        assert_eq!(Position::new(2, 2).neighbours(3).count(), 2);
    }

    #[test]
    fn test_display_roundtrips_layout() {
        let b = board("Rg#\nYP2\nBBG");
        let text = b.to_string().replace(' ', "");
        let again: Board = text.parse().expect("display output parses");
        assert!(again.same_layout(&b));
    }
}
