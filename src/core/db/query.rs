/// Query Result Module
///
/// This module holds the raw rows a driver returns and shapes them into
/// records for the caller, according to the requested fetch mode.
use crate::core::db::value::Value;
use crate::core::{AccessError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Shape of each fetched row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Column name to value, in column order
    #[default]
    Assoc,
    /// Values by position
    Num,
    /// Both of the above
    Both,
    /// A single column by 0-based index
    Column(usize),
}

/// A row keyed by column name.
///
/// Column order is kept. When two columns share a name the later value wins
/// and the name keeps its first position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssocRow {
    entries: Vec<(String, Value)>,
}

impl AssocRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn insert(&mut self, column: &str, value: Value) {
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column.to_string(), value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AssocRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One fetched row in the requested shape.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Record {
    Assoc(AssocRow),
    Num(Vec<Value>),
    Both { assoc: AssocRow, num: Vec<Value> },
    Column(Value),
}

impl Record {
    /// Looks a column up by name. Only meaningful for `Assoc` and `Both`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        match self {
            Record::Assoc(row) | Record::Both { assoc: row, .. } => row.get(column),
            _ => None,
        }
    }

    /// Looks a column up by position. Only meaningful for `Num` and `Both`.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Record::Num(values) | Record::Both { num: values, .. } => values.get(index),
            _ => None,
        }
    }
}

/// Rows returned by one driver call, before shaping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    /// Column names from the query result
    pub columns: Vec<String>,
    /// Rows of values, in driver order
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        ResultSet { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Checks that `mode` can be applied to rows of this result.
    pub fn check_mode(&self, mode: FetchMode) -> Result<()> {
        match mode {
            FetchMode::Column(index) if !self.columns.is_empty() && index >= self.columns.len() => {
                Err(AccessError::InvalidColumn {
                    index,
                    count: self.columns.len(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Shapes one row of this result. `check_mode` must have passed.
    pub fn shape(&self, row: Vec<Value>, mode: FetchMode) -> Record {
        match mode {
            FetchMode::Assoc => Record::Assoc(self.assoc(&row)),
            FetchMode::Num => Record::Num(row),
            FetchMode::Both => Record::Both {
                assoc: self.assoc(&row),
                num: row,
            },
            FetchMode::Column(index) => Record::Column(row.into_iter().nth(index).unwrap_or_default()),
        }
    }

    fn assoc(&self, row: &[Value]) -> AssocRow {
        let mut assoc = AssocRow::default();
        for (name, value) in self.columns.iter().zip(row) {
            assoc.insert(name, value.clone());
        }
        assoc
    }
}

/// A forward-only cursor over a result set.
#[derive(Debug, Clone, Default)]
pub struct ResultCursor {
    set: ResultSet,
    position: usize,
}

impl ResultCursor {
    pub fn new(set: ResultSet) -> Self {
        ResultCursor { set, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.set.rows.len().saturating_sub(self.position)
    }

    /// Fetches the next row, or every remaining row.
    pub fn fetch(&mut self, single_row: bool, mode: FetchMode) -> Result<QueryResult> {
        self.set.check_mode(mode)?;
        let end = if single_row {
            (self.position + 1).min(self.set.rows.len())
        } else {
            self.set.rows.len()
        };
        let taken: Vec<Vec<Value>> = self.set.rows[self.position..end].to_vec();
        self.position = end;
        let records = taken.into_iter().map(|row| self.set.shape(row, mode));

        Ok(if single_row {
            QueryResult::Row(records.into_iter().next())
        } else {
            QueryResult::Rows(records.collect())
        })
    }
}

/// What a query or fetch call returns.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Single-row fetch; `None` when no row was left
    Row(Option<Record>),
    /// All (remaining) rows in driver order
    Rows(Vec<Record>),
    /// Sentinel for a driver failure under a non-raising error mode
    Failed,
}

impl QueryResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, QueryResult::Failed)
    }

    pub fn len(&self) -> usize {
        match self {
            QueryResult::Row(row) => row.is_some() as usize,
            QueryResult::Rows(rows) => rows.len(),
            QueryResult::Failed => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first record, if any.
    pub fn into_row(self) -> Option<Record> {
        match self {
            QueryResult::Row(row) => row,
            QueryResult::Rows(rows) => rows.into_iter().next(),
            QueryResult::Failed => None,
        }
    }

    pub fn into_rows(self) -> Vec<Record> {
        match self {
            QueryResult::Row(row) => row.into_iter().collect(),
            QueryResult::Rows(rows) => rows,
            QueryResult::Failed => Vec::new(),
        }
    }
}
