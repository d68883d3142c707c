use nalgebra::DMatrix;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};

/// Integer stoichiometric matrix with named rows and columns. Rows are
/// the inner pools, columns the reactions; entry (p, r) counts product
/// occurrences of p in r minus educt occurrences. Input pools do not
/// appear: only internal mass balance matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoichMatrixInteger {
    row_names: Vec<String>,
    col_names: Vec<String>,
    matrix: DMatrix<i32>,
}

impl StoichMatrixInteger {
    pub fn new(row_names: Vec<String>, col_names: Vec<String>) -> Self {
        let matrix = DMatrix::zeros(row_names.len(), col_names.len());
        StoichMatrixInteger {
            row_names,
            col_names,
            matrix,
        }
    }

    pub fn nrows(&self) -> usize {
        self.row_names.len()
    }

    pub fn ncols(&self) -> usize {
        self.col_names.len()
    }

    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }

    pub fn col_names(&self) -> &[String] {
        &self.col_names
    }

    pub fn row_index(&self, pool: &str) -> Option<usize> {
        self.row_names.iter().position(|n| n == pool)
    }

    pub fn col_index(&self, reaction: &str) -> Option<usize> {
        self.col_names.iter().position(|n| n == reaction)
    }

    pub fn add(&mut self, row: usize, col: usize, delta: i32) {
        self.matrix[(row, col)] += delta;
    }

    /// entry by pool and reaction name
    pub fn get(&self, pool: &str, reaction: &str) -> Option<i32> {
        let r = self.row_index(pool)?;
        let c = self.col_index(reaction)?;
        Some(self.matrix[(r, c)])
    }

    pub fn matrix(&self) -> &DMatrix<i32> {
        &self.matrix
    }

    /// table rendering for logs and console inspection
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        let mut header: Vec<Cell> = vec![Cell::new("")];
        header.extend(self.col_names.iter().map(|n| Cell::new(n)));
        table.add_row(Row::new(header));
        for (i, pool) in self.row_names.iter().enumerate() {
            let mut row: Vec<Cell> = vec![Cell::new(pool)];
            row.extend(
                (0..self.ncols()).map(|j| Cell::new(&self.matrix[(i, j)].to_string())),
            );
            table.add_row(Row::new(row));
        }
        table
    }

    pub fn print_std(&self) {
        self.to_table().printstd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_indexing() {
        let mut s = StoichMatrixInteger::new(
            vec!["B".to_string(), "C".to_string()],
            vec!["v1".to_string(), "v2".to_string()],
        );
        s.add(0, 0, 1);
        s.add(1, 0, -1);
        s.add(1, 1, 1);
        assert_eq!(s.get("B", "v1"), Some(1));
        assert_eq!(s.get("C", "v1"), Some(-1));
        assert_eq!(s.get("C", "v2"), Some(1));
        assert_eq!(s.get("B", "v2"), Some(0));
        assert_eq!(s.get("A", "v1"), None);
    }

    #[test]
    fn test_table_dimensions() {
        let s = StoichMatrixInteger::new(
            vec!["B".to_string()],
            vec!["v1".to_string(), "v2".to_string()],
        );
        let table = s.to_table();
        // header + one pool row
        assert_eq!(table.len(), 2);
    }
}
