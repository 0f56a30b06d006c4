//! Purpose: Contract between a query context and the external query facility.
//! Exports: `Connection`, `ConnectionPool`, `Fetch`, `Cell`, `Diagnostic`.
//! Role: Row-oriented cursor seen through one pooled connection.
//! Invariants: Columns are addressed from zero in result order.
//! Invariants: A connection is held by exactly one query context at a time.

use std::error::Error as StdError;
use std::fmt;

use crate::core::error::Error;
use crate::core::node::Node;

/// One diagnostic record reported by the driver for a failed call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub state: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.state, self.message)
    }
}

impl StdError for Diagnostic {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fetch {
    Row,
    NoData,
}

/// Raw text of one cell of the current row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    /// The cell is not null but the driver produced no data for it.
    Unavailable,
}

pub trait Connection {
    /// Submits `text` and opens a cursor over its result.
    fn execute(&mut self, text: &str) -> Result<(), Diagnostic>;

    fn column_count(&mut self) -> Result<usize, Diagnostic>;

    fn column_label(&mut self, column: usize) -> Result<String, Diagnostic>;

    /// Moves the cursor to the next row.
    fn fetch(&mut self) -> Result<Fetch, Diagnostic>;

    fn text_cell(&mut self, column: usize) -> Result<Cell, Diagnostic>;

    /// Integer value of a cell; `None` when the cell is null.
    fn int_cell(&mut self, column: usize) -> Result<Option<i64>, Diagnostic>;

    /// Turns raw cell text into a node using the backend's lexical rules.
    fn decode_node(&mut self, column: usize, text: &str) -> Option<Node>;

    fn close_cursor(&mut self);
}

pub trait ConnectionPool {
    fn acquire(&self) -> Result<Box<dyn Connection>, Error>;

    fn release(&self, connection: Box<dyn Connection>);
}
