use calamine::{Data, Range};

/// A single worksheet cell, reduced to the shapes the extractor cares about
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// Date-formatted cell, kept as its rendered text; never a number
    Date(String),
}

impl Cell {
    /// Blank cells are empty or contain only whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::Date(_) => false,
        }
    }

    /// Cell rendered as trimmed text, with empty cells as ""
    pub fn trimmed_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => n.to_string(),
            Cell::Date(s) => s.clone(),
        }
    }

    /// Float coercion: numbers pass through, text is trimmed and parsed.
    /// Empty and date cells have no number to offer.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Empty | Cell::Date(_) => None,
        }
    }

    /// Float-then-int coercion (`2024.0` -> 2024), truncating toward zero
    pub fn as_i32(&self) -> Option<i32> {
        let f = self.as_f64()?;
        if !f.is_finite() {
            return None;
        }
        let truncated = f.trunc();
        if truncated < i32::MIN as f64 || truncated > i32::MAX as f64 {
            return None;
        }
        Some(truncated as i32)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
            // A date is not a price or a year, even though Excel stores a serial
            Data::DateTime(dt) => Cell::Date(
                dt.as_datetime()
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| dt.as_f64().to_string()),
            ),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// Rectangular, 0-indexed grid of cells addressed by absolute sheet position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellGrid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl CellGrid {
    /// Build a grid from row vectors. Ragged rows are padded with empty cells
    /// up to the longest row.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Self { rows, width }
    }

    /// Build a grid from a calamine worksheet range.
    ///
    /// calamine trims a range to its used area, so a sheet whose first value sits at
    /// C5 yields a range starting at (4, 2). The grid keeps absolute positions: the
    /// rows and columns above/left of the used area are materialised as empty cells.
    pub fn from_range(range: &Range<Data>) -> Self {
        let (Some((start_row, start_col)), Some((end_row, end_col))) = (range.start(), range.end())
        else {
            return Self::default();
        };

        let height = end_row as usize + 1;
        let width = end_col as usize + 1;
        let mut rows = vec![vec![Cell::Empty; width]; height];

        for (row, col, data) in range.used_cells() {
            let abs_row = start_row as usize + row;
            let abs_col = start_col as usize + col;
            rows[abs_row][abs_col] = Cell::from(data);
        }

        Self { rows, width }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Cell at (row, col); positions outside the grid read as empty
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(EMPTY)
    }

    /// Overwrite a cell. Writes outside the grid are ignored.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = cell;
        }
    }

    /// Iterate the cells of one column, top to bottom
    pub fn column(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        (0..self.height()).map(move |row| self.get(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn test_blank_detection() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::Text("".to_string()).is_blank());
        assert!(Cell::Text("  \t ".to_string()).is_blank());
        assert!(!Cell::Text(" x ".to_string()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
        assert!(!Cell::Date("2023-03-15 00:00:00".to_string()).is_blank());
    }

    #[test]
    fn test_integer_coercion_from_float() {
        assert_eq!(Cell::Number(2024.0).as_i32(), Some(2024));
        assert_eq!(Cell::Text(" 2024.0 ".to_string()).as_i32(), Some(2024));
        assert_eq!(Cell::Number(7.9).as_i32(), Some(7));
        assert_eq!(Cell::Text("Jan".to_string()).as_i32(), None);
        assert_eq!(Cell::Empty.as_i32(), None);
        assert_eq!(Cell::Number(f64::NAN).as_i32(), None);
        assert_eq!(Cell::Number(1e12).as_i32(), None);
        assert_eq!(Cell::Date("2023-03-15 00:00:00".to_string()).as_i32(), None);
    }

    #[test]
    fn test_datetime_cell_is_not_numeric() {
        let mut range: Range<Data> = Range::new((0, 0), (0, 1));
        // 45000 is 2023-03-15 in the 1900 date system
        range.set_value(
            (0, 0),
            Data::DateTime(ExcelDateTime::new(
                45000.0,
                ExcelDateTimeType::DateTime,
                false,
            )),
        );
        range.set_value((0, 1), Data::Float(45000.0));

        let grid = CellGrid::from_range(&range);
        let date = grid.get(0, 0);
        assert!(matches!(date, Cell::Date(_)));
        assert!(date.trimmed_text().starts_with("2023-03-15"));
        assert_eq!(date.as_f64(), None);
        assert_eq!(date.as_i32(), None);
        assert_eq!(grid.get(0, 1).as_f64(), Some(45000.0));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let grid = CellGrid::from_rows(vec![
            vec![Cell::Number(1.0)],
            vec![Cell::Empty, Cell::Empty, Cell::Text("x".to_string())],
        ]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(0, 2), &Cell::Empty);
        assert_eq!(grid.get(5, 5), &Cell::Empty);
    }

    #[test]
    fn test_from_range_keeps_absolute_positions() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 3));
        range.set_value((2, 1), Data::Float(2023.0));
        range.set_value((3, 3), Data::String("(".to_string()));
        range.set_value((3, 2), Data::Int(5));

        let grid = CellGrid::from_range(&range);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.get(2, 1), &Cell::Number(2023.0));
        assert_eq!(grid.get(3, 2), &Cell::Number(5.0));
        assert_eq!(grid.get(3, 3), &Cell::Text("(".to_string()));
        assert_eq!(grid.get(0, 0), &Cell::Empty);
    }

    #[test]
    fn test_from_empty_range() {
        let range: Range<Data> = Range::empty();
        let grid = CellGrid::from_range(&range);
        assert_eq!(grid.height(), 0);
        assert_eq!(grid.width(), 0);
    }
}
