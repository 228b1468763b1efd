pub const ROWS: usize = 4;
pub const COLS: usize = 5;
pub const CELLS: usize = ROWS * COLS;

/// Number of equal marks in a line needed to win.
pub const WIN_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cell {
    Empty,
    Red,
    Yellow,
}

impl Cell {
    /// Numeric code used in state keys: 0 empty, 1 red, 2 yellow.
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Red => 1,
            Cell::Yellow => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Red),
            2 => Some(Cell::Yellow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    /// Get the cell at a specific position.
    /// Row 0 is the top, row 3 is the bottom.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Check if a column has at least one empty cell
    pub fn column_has_space(&self, col: usize) -> bool {
        col < COLS && (0..ROWS).any(|row| self.cells[row][col] == Cell::Empty)
    }

    /// Lowest empty slot of a column, counted from the bottom (0 = bottom row).
    pub fn lowest_free_row(&self, col: usize) -> Option<usize> {
        if col >= COLS {
            return None;
        }
        (0..ROWS).find(|&from_bottom| self.cells[ROWS - 1 - from_bottom][col] == Cell::Empty)
    }

    /// Write a mark at `row` (counted from the bottom) in `col`.
    ///
    /// The caller is responsible for targeting an empty cell; an occupied
    /// target is a contract violation caught by a debug assertion.
    pub fn place(&mut self, row: usize, col: usize, cell: Cell) {
        let slot = &mut self.cells[ROWS - 1 - row][col];
        debug_assert_eq!(
            *slot,
            Cell::Empty,
            "cell ({row}, {col}) is already occupied"
        );
        *slot = cell;
    }

    /// Check if the board is completely full
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|&c| c != Cell::Empty)
    }

    /// Row-major copy of the cells, top row first.
    pub fn flatten(&self) -> [Cell; CELLS] {
        let mut flat = [Cell::Empty; CELLS];
        for (i, &cell) in self.cells.iter().flatten().enumerate() {
            flat[i] = cell;
        }
        flat
    }

    /// Scan every line of length >= 4 for four consecutive equal marks.
    ///
    /// Lines are visited in a fixed order: diagonals running top-left to
    /// bottom-right, then the mirrored diagonals, then rows, then columns.
    /// The mark of the first winning window found is returned.
    pub fn winner(&self) -> Option<Cell> {
        let offsets = (1 - ROWS as isize)..(COLS as isize);
        let diagonals = offsets.clone().map(|offset| self.diagonal(offset, false));
        let anti_diagonals = offsets.map(|offset| self.diagonal(offset, true));
        let rows = (0..ROWS).map(|row| self.cells[row].to_vec());
        let cols = (0..COLS).map(|col| {
            (0..ROWS)
                .map(|row| self.cells[row][col])
                .collect::<Vec<_>>()
        });

        diagonals
            .chain(anti_diagonals)
            .chain(rows)
            .chain(cols)
            .filter(|line: &Vec<Cell>| line.len() >= WIN_LENGTH)
            .find_map(|line| first_run(&line))
    }

    /// Cells on the diagonal where `col - row == offset`. When `mirrored` is
    /// set the columns are read right to left.
    fn diagonal(&self, offset: isize, mirrored: bool) -> Vec<Cell> {
        (0..ROWS)
            .filter_map(|row| {
                let col = row as isize + offset;
                if col < 0 || col >= COLS as isize {
                    return None;
                }
                let col = col as usize;
                let col = if mirrored { COLS - 1 - col } else { col };
                Some(self.cells[row][col])
            })
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// First mark that fills a sliding window of `WIN_LENGTH` cells.
fn first_run(line: &[Cell]) -> Option<Cell> {
    line.windows(WIN_LENGTH)
        .find(|window| window[0] != Cell::Empty && window.iter().all(|&c| c == window[0]))
        .map(|window| window[0])
}
