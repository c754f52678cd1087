use rand::Rng;
use std::fmt;

/// A direction to move/merge tiles.
///
/// The declaration order is the base order in which legal moves are
/// enumerated: Up, Down, Left, Right (codes 0..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All four directions in base order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Stable numeric code (0 = Up, 1 = Down, 2 = Left, 3 = Right).
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    /// Inverse of [`Move::code`]. Returns `None` for codes above 3.
    #[inline]
    pub fn from_code(code: u8) -> Option<Move> {
        Move::ALL.get(code as usize).copied()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

/// A (row, column) coordinate into a [`Board`].
pub type Cell = (usize, usize);

type Tile = u32;
type Score = u64;

/// A legal move paired with the board it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOption {
    pub dir: Move,
    pub board: Board,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("board must have at least one row")]
    Empty,
    #[error("row {row} has {len} cells, expected {size}")]
    NotSquare { row: usize, len: usize, size: usize },
    #[error("{len} cells do not fill a {size}x{size} board")]
    CellCount { len: usize, size: usize },
    #[error("tile value {0} is not a power of two >= 2")]
    BadTile(u32),
}

/// Square 2048 board stored row-major; 0 is an empty cell, anything else a tile value.
///
/// Boards are plain values: every operation that changes tiles either
/// returns a new board or works on a clone owned by the caller.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Tile>,
}

impl Board {
    /// Standard board dimension.
    pub const DEFAULT_SIZE: usize = 4;

    /// An empty `size x size` board. `size` must be non-zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "board size must be non-zero");
        Board { size, cells: vec![0; size * size] }
    }

    /// Build a board from rows of tile values.
    ///
    /// ```
    /// use ai_2048_agent::engine::Board;
    /// let b = Board::from_rows(&[[2, 2], [0, 0]]).unwrap();
    /// assert_eq!(b.size(), 2);
    /// assert_eq!(b.cell(0, 1), Some(2));
    /// assert_eq!(b.cell(2, 0), None);
    /// ```
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, EngineError> {
        let size = rows.len();
        if size == 0 {
            return Err(EngineError::Empty);
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != size {
                return Err(EngineError::NotSquare { row, len: values.len(), size });
            }
            cells.extend_from_slice(values);
        }
        Board::from_cells(size, cells)
    }

    /// Build a `size x size` board from row-major cells.
    pub fn from_cells(size: usize, cells: Vec<u32>) -> Result<Self, EngineError> {
        if size == 0 {
            return Err(EngineError::Empty);
        }
        if cells.len() != size * size {
            return Err(EngineError::CellCount { len: cells.len(), size });
        }
        if let Some(&bad) = cells.iter().find(|&&v| v != 0 && (v < 2 || !v.is_power_of_two())) {
            return Err(EngineError::BadTile(bad));
        }
        Ok(Board { size, cells })
    }

    /// Board dimension.
    #[inline]
    pub fn size(&self) -> usize { self.size }

    /// Tile values as rows.
    pub fn rows(&self) -> Vec<Vec<u32>> {
        self.cells.chunks(self.size).map(|r| r.to_vec()).collect()
    }

    /// Row-major view of every cell.
    #[inline]
    pub fn cells(&self) -> &[u32] { &self.cells }

    /// Value at `(row, col)`; `None` when the coordinate is off the board.
    ///
    /// `None` means "no neighbour" and is distinct from an empty cell (`Some(0)`).
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Option<u32> {
        if row < self.size && col < self.size {
            Some(self.cells[row * self.size + col])
        } else {
            None
        }
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// ```
    /// use ai_2048_agent::engine::{Board, Move};
    /// let b = Board::from_rows(&[[2, 2], [0, 4]]).unwrap();
    /// assert_eq!(b.shift(Move::Left), Board::from_rows(&[[4, 0], [4, 0]]).unwrap());
    /// ```
    #[inline]
    pub fn shift(&self, dir: Move) -> Board { self.shift_with_reward(dir).0 }

    /// Like [`Board::shift`], also returning the sum of the tiles created by merges.
    pub fn shift_with_reward(&self, dir: Move) -> (Board, Score) {
        let mut out = self.clone();
        let mut reward = 0;
        let mut line = vec![0; self.size];
        for k in 0..self.size {
            let idxs = line_indices(self.size, k, dir);
            for (slot, &i) in line.iter_mut().zip(&idxs) {
                *slot = self.cells[i];
            }
            reward += shift_line_left(&mut line);
            for (&v, &i) in line.iter().zip(&idxs) {
                out.cells[i] = v;
            }
        }
        (out, reward)
    }

    /// Moves that change the board, in base order Up, Down, Left, Right.
    pub fn available_moves(&self) -> Vec<MoveOption> {
        Move::ALL
            .iter()
            .filter_map(|&dir| {
                let board = self.shift(dir);
                (board != *self).then_some(MoveOption { dir, board })
            })
            .collect()
    }

    /// Coordinates of every empty cell, row-major.
    pub fn available_cells(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 0)
            .map(|(i, _)| (i / self.size, i % self.size))
            .collect()
    }

    /// Place `value` on the empty cell `cell`.
    #[inline]
    pub fn insert_tile(&mut self, cell: Cell, value: u32) {
        let idx = cell.0 * self.size + cell.1;
        debug_assert_eq!(self.cells[idx], 0, "insert_tile on occupied cell {cell:?}");
        self.cells[idx] = value;
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use ai_2048_agent::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::new(4).with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(&self, rng: &mut R) -> Board {
        let empty = self.available_cells();
        if empty.is_empty() {
            return self.clone();
        }
        let cell = empty[rng.gen_range(0..empty.len())];
        let mut out = self.clone();
        out.insert_tile(cell, generate_random_tile(rng));
        out
    }

    /// Perform a move then insert a random tile if the move changed the board.
    pub fn make_move<R: Rng + ?Sized>(&self, dir: Move, rng: &mut R) -> Board {
        let moved = self.shift(dir);
        if moved != *self { moved.with_random_tile(rng) } else { moved }
    }

    /// Return true if no legal moves remain.
    ///
    /// ```
    /// use ai_2048_agent::engine::Board;
    /// assert!(Board::new(4).is_game_over());
    /// assert!(Board::from_rows(&[[2, 4], [4, 2]]).unwrap().is_game_over());
    /// ```
    pub fn is_game_over(&self) -> bool {
        Move::ALL.iter().all(|&dir| self.shift(dir) == *self)
    }

    /// Highest tile value on the board (0 for an empty board).
    #[inline]
    pub fn highest_tile(&self) -> Tile { self.cells.iter().copied().max().unwrap_or(0) }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(&self) -> usize { self.cells.iter().filter(|&&v| v == 0).count() }
}

impl Default for Board {
    fn default() -> Self { Board::new(Board::DEFAULT_SIZE) }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.rows())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat((self.size * 8).saturating_sub(1));
        writeln!(f)?;
        for (r, row) in self.cells.chunks(self.size).enumerate() {
            if r > 0 {
                writeln!(f, "{rule}")?;
            }
            let line: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile { if rng.gen_range(0..10) < 9 { 2 } else { 4 } }

// Cell indices of line `k`, ordered so that tiles slide towards index 0.
fn line_indices(size: usize, k: usize, dir: Move) -> Vec<usize> {
    match dir {
        Move::Left => (0..size).map(|c| k * size + c).collect(),
        Move::Right => (0..size).rev().map(|c| k * size + c).collect(),
        Move::Up => (0..size).map(|r| r * size + k).collect(),
        Move::Down => (0..size).rev().map(|r| r * size + k).collect(),
    }
}

fn shift_line_left(line: &mut [Tile]) -> Score {
    (0..line.len()).map(|i| collapse_front(&mut line[i..])).sum()
}

// Pull the first tile of `slice` into slot 0 and merge it with the next tile if equal.
fn collapse_front(slice: &mut [Tile]) -> Score {
    let mut acc = 0;
    let mut reward = 0;
    for idx in 0..slice.len() {
        let val = slice[idx];
        if acc != 0 && acc == val {
            slice[idx] = 0;
            acc *= 2;
            reward = acc as Score;
            break;
        } else if acc != 0 && val != 0 {
            break;
        } else if acc == 0 && val != 0 {
            slice[idx] = 0;
            acc = val;
        }
    }
    slice[0] = acc;
    reward
}

fn format_val(val: Tile) -> String {
    if val == 0 { " ".repeat(7) } else { format!("{:^7}", val) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn shifted(mut v: Vec<u32>) -> (Vec<u32>, u64) {
        let r = shift_line_left(&mut v);
        (v, r)
    }

    fn board(rows: &[[u32; 4]]) -> Board { Board::from_rows(rows).unwrap() }

    #[test]
    fn it_shift_line_left() {
        assert_eq!(shifted(vec![0, 0, 0, 0]), (vec![0, 0, 0, 0], 0));
        assert_eq!(shifted(vec![2, 4, 2, 4]), (vec![2, 4, 2, 4], 0));
        assert_eq!(shifted(vec![2, 2, 4, 4]), (vec![4, 8, 0, 0], 12));
        assert_eq!(shifted(vec![2, 0, 0, 2]), (vec![4, 0, 0, 0], 4));
        assert_eq!(shifted(vec![2, 2, 2, 0]), (vec![4, 2, 0, 0], 4));
        assert_eq!(shifted(vec![4, 4, 8, 0]), (vec![8, 8, 0, 0], 8));
        assert_eq!(shifted(vec![0, 2, 2]), (vec![4, 0, 0], 4));
    }

    #[test]
    fn test_move_left_right() {
        let b = board(&[[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        assert_eq!(b.shift(Move::Left), board(&[[2, 4, 8, 16], [2, 16, 4, 0], [8, 0, 0, 0], [2, 4, 0, 0]]));
        assert_eq!(b.shift(Move::Right), board(&[[2, 4, 8, 16], [0, 2, 16, 4], [0, 0, 0, 8], [0, 0, 2, 4]]));
    }

    #[test]
    fn test_move_up_down() {
        let b = board(&[[2, 2, 4, 2], [4, 8, 0, 0], [8, 8, 0, 0], [16, 4, 4, 4]]);
        assert_eq!(b.shift(Move::Up), board(&[[2, 2, 8, 2], [4, 16, 0, 4], [8, 4, 0, 0], [16, 0, 0, 0]]));
        assert_eq!(b.shift(Move::Down), board(&[[2, 0, 0, 0], [4, 2, 0, 0], [8, 16, 0, 2], [16, 4, 8, 4]]));
    }

    #[test]
    fn test_shift_reward() {
        let b = board(&[[2, 2, 4, 4], [0, 0, 0, 0], [8, 8, 0, 0], [0, 0, 0, 0]]);
        let (_, reward) = b.shift_with_reward(Move::Left);
        assert_eq!(reward, 4 + 8 + 16);
    }

    #[test]
    fn it_available_moves_in_base_order() {
        let b = Board::from_rows(&[[2, 0], [0, 0]]).unwrap();
        let dirs: Vec<Move> = b.available_moves().iter().map(|o| o.dir).collect();
        assert_eq!(dirs, vec![Move::Down, Move::Right]);
        for opt in b.available_moves() {
            assert_eq!(opt.board, b.shift(opt.dir));
            assert_ne!(opt.board, b);
        }
        let open = board(&[[2, 0, 0, 0], [0, 0, 0, 0], [0, 0, 4, 0], [0, 0, 0, 0]]);
        let dirs: Vec<Move> = open.available_moves().iter().map(|o| o.dir).collect();
        assert_eq!(dirs, Move::ALL.to_vec());
    }

    #[test]
    fn it_available_cells_and_insert() {
        let mut b = Board::from_rows(&[[2, 0], [0, 4]]).unwrap();
        assert_eq!(b.available_cells(), vec![(0, 1), (1, 0)]);
        b.insert_tile((1, 0), 2);
        assert_eq!(b.available_cells(), vec![(0, 1)]);
        assert_eq!(b.cell(1, 0), Some(2));
    }

    #[test]
    fn it_cell_out_of_range_is_none() {
        let b = Board::new(4);
        assert_eq!(b.cell(3, 3), Some(0));
        assert_eq!(b.cell(4, 0), None);
        assert_eq!(b.cell(0, 4), None);
    }

    #[test]
    fn it_test_insert_random_tile() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut game = Board::new(4);
        for _ in 0..16 {
            game = game.with_random_tile(&mut rng);
        }
        assert_eq!(game.count_empty(), 0);
        assert!(game.cells().iter().all(|&v| v == 2 || v == 4));
        assert_eq!(game.with_random_tile(&mut rng), game);
    }

    #[test]
    fn it_make_move_noop_keeps_board() {
        let mut rng = StdRng::seed_from_u64(1);
        let b = Board::from_rows(&[[2, 0], [0, 0]]).unwrap();
        assert_eq!(b.make_move(Move::Up, &mut rng), b);
        let moved = b.make_move(Move::Right, &mut rng);
        assert_eq!(moved.count_empty(), 2);
        assert_eq!(moved.cell(0, 1), Some(2));
    }

    #[test]
    fn it_from_rows_rejects_bad_input() {
        assert_eq!(Board::from_rows::<[u32; 0]>(&[]), Err(EngineError::Empty));
        assert_eq!(
            Board::from_rows(&[vec![2, 0], vec![0]]),
            Err(EngineError::NotSquare { row: 1, len: 1, size: 2 })
        );
        assert_eq!(Board::from_rows(&[[3, 0], [0, 0]]), Err(EngineError::BadTile(3)));
        assert_eq!(Board::from_rows(&[[1, 0], [0, 0]]), Err(EngineError::BadTile(1)));
        assert_eq!(Board::from_cells(2, vec![2, 0, 0]), Err(EngineError::CellCount { len: 3, size: 2 }));
        assert_eq!(Board::from_cells(2, vec![2, 0, 0, 8]).map(|b| b.highest_tile()), Ok(8));
    }

    #[test]
    fn it_game_over_and_highest_tile() {
        let stuck = board(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 128]]);
        assert!(stuck.is_game_over());
        assert_eq!(stuck.highest_tile(), 128);
        let mergeable = board(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 4]]);
        assert!(!mergeable.is_game_over());
    }

    #[test]
    fn it_move_codes() {
        for m in Move::ALL {
            assert_eq!(Move::from_code(m.code()), Some(m));
        }
        assert_eq!(Move::from_code(4), None);
    }
}
