//! Tabular frames: rows of values under named columns.

use super::Value;
use super::error::ShapeError;

/// Row-major table with named columns.
///
/// Every row carries exactly one value per column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ShapeError> {
        check_unique(&columns)?;
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ShapeError::RowWidth {
                    row: index,
                    expected: columns.len(),
                    got: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from `(name, values)` columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self, ShapeError> {
        let num_rows = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        let mut names = Vec::with_capacity(columns.len());
        let mut rows: Vec<Vec<Value>> = (0..num_rows)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();

        for (name, values) in columns {
            if values.len() != num_rows {
                return Err(ShapeError::ColumnLength {
                    column: name,
                    expected: num_rows,
                    got: values.len(),
                });
            }
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
            names.push(name);
        }

        check_unique(&names)?;
        Ok(Self {
            columns: names,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        self.rows.iter().map(|row| row.get(index)).collect()
    }

    /// Column-major view: `(name, values)` in column order.
    pub fn to_columns(&self) -> Vec<(String, Vec<Value>)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let values = self
                    .rows
                    .iter()
                    .map(|row| row.get(index).cloned().unwrap_or(Value::None))
                    .collect();
                (name.clone(), values)
            })
            .collect()
    }

    /// Rows with their values reordered to follow `order`.
    ///
    /// Returns `None` unless `order` names exactly this table's columns.
    pub fn rows_in_column_order(&self, order: &[String]) -> Option<Vec<Vec<Value>>> {
        if order.len() != self.columns.len() {
            return None;
        }
        let indices = order
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Option<Vec<_>>>()?;
        self.rows
            .iter()
            .map(|row| indices.iter().map(|&i| row.get(i).cloned()).collect())
            .collect()
    }
}

fn check_unique(columns: &[String]) -> Result<(), ShapeError> {
    for (index, name) in columns.iter().enumerate() {
        if columns.iter().skip(index + 1).any(|other| other == name) {
            return Err(ShapeError::DuplicateColumn(name.clone()));
        }
    }
    Ok(())
}
