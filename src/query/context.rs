//! Purpose: Execution state for one query text against one pooled connection.
//! Exports: `QueryContext`, `QueryOptions`, `QueryState`.
//! Role: Turns the driver's row cursor into bindings, boolean and graph views.
//! Invariants: The connection is acquired in `new` and released once, by `terminate` or drop.
//! Invariants: Column names and row cells always have the same length.
//! Invariants: A failed context reports its failure without calling the driver again.
//! Notes: The first row is fetched eagerly by `execute`; `advance` is the only row step.

use tracing::{debug, error};
use url::Url;

use crate::core::error::{Error, ErrorKind};
use crate::core::node::{Node, NodeSlot};
use crate::core::stream::QuadStream;
use crate::query::driver::{Cell, Connection, ConnectionPool, Diagnostic, Fetch};
use crate::query::graph::GraphRows;
use crate::query::shape::{Shape, classify};

#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    base_uri: Option<Url>,
    limit: Option<usize>,
    offset: usize,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_uri(mut self, base_uri: Url) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    /// Stops after `limit` rows have been made current.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` rows of the result.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryState {
    /// Acquired a connection and classified the text; not yet executed.
    Classified,
    /// Executed; the cursor sits before the first row.
    Executing,
    RowAvailable,
    Exhausted,
    Failed,
    Closed,
}

#[derive(Clone, Debug)]
struct Failure {
    kind: ErrorKind,
    message: String,
}

pub struct QueryContext<'p> {
    pool: &'p dyn ConnectionPool,
    connection: Option<Box<dyn Connection>>,
    text: String,
    base_uri: Option<Url>,
    shape: Shape,
    state: QueryState,
    columns: Vec<String>,
    row: Vec<NodeSlot>,
    limit: Option<usize>,
    offset: usize,
    skipped: usize,
    rows_consumed: usize,
    cursor_open: bool,
    boolean: Option<bool>,
    failure: Option<Failure>,
}

impl<'p> QueryContext<'p> {
    /// Acquires a connection from `pool` and classifies `text` by its leading keyword.
    pub fn new(
        pool: &'p dyn ConnectionPool,
        text: &str,
        options: QueryOptions,
    ) -> Result<Self, Error> {
        let connection = pool.acquire()?;
        let shape = classify(text);
        debug!(%shape, "classified query");
        Ok(Self {
            pool,
            connection: Some(connection),
            text: text.to_string(),
            base_uri: options.base_uri,
            shape,
            state: QueryState::Classified,
            columns: Vec::new(),
            row: Vec::new(),
            limit: options.limit,
            offset: options.offset,
            skipped: 0,
            rows_consumed: 0,
            cursor_open: false,
            boolean: None,
            failure: None,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Submits the query and positions the result on its first row.
    ///
    /// Boolean queries are left before their single row; `boolean` reads it.
    pub fn execute(&mut self) -> Result<(), Error> {
        self.ensure_usable()?;
        self.reset_results();
        self.state = QueryState::Executing;

        let Some(connection) = self.connection.as_deref_mut() else {
            return Err(closed_error());
        };
        if let Err(diagnostic) = connection.execute(&self.text) {
            self.shape |= Shape::SYNTAX;
            return Err(self.driver_failure("execute", diagnostic));
        }
        self.cursor_open = true;

        let count = match connection.column_count() {
            Ok(count) => count,
            Err(diagnostic) => return Err(self.driver_failure("column_count", diagnostic)),
        };
        let mut columns = Vec::with_capacity(count);
        for column in 0..count {
            match connection.column_label(column) {
                Ok(label) => columns.push(label),
                Err(diagnostic) => return Err(self.driver_failure("column_label", diagnostic)),
            }
        }
        self.row = (0..count).map(|_| NodeSlot::empty()).collect();
        self.columns = columns;
        debug!(columns = count, shape = %self.shape, "executed query");

        if count == 0 {
            self.state = QueryState::Exhausted;
            return Ok(());
        }
        self.shape |= Shape::BINDINGS;
        if self.shape.contains(Shape::BOOLEAN) {
            return Ok(());
        }
        self.advance().map(|_| ())
    }

    /// Moves to the next result row; `Ok(false)` once the result is exhausted.
    pub fn next_row(&mut self) -> Result<bool, Error> {
        self.ensure_usable()?;
        match self.state {
            QueryState::Classified => Err(not_executed_error()),
            QueryState::Exhausted => Ok(false),
            _ => self.advance(),
        }
    }

    /// True when no row is current and none will follow, including after failure.
    pub fn is_finished(&self) -> bool {
        !matches!(self.state, QueryState::Executing | QueryState::RowAvailable)
    }

    pub fn is_failed(&self) -> bool {
        self.state == QueryState::Failed
    }

    /// Rows made current so far; `None` when failed or the result has no columns.
    pub fn rows_consumed(&self) -> Option<usize> {
        if self.is_failed() || self.columns.is_empty() {
            return None;
        }
        Some(self.rows_consumed)
    }

    pub fn binding_count(&self) -> Option<usize> {
        if self.is_failed() || self.columns.is_empty() {
            return None;
        }
        Some(self.columns.len())
    }

    pub fn binding_name(&self, index: usize) -> Option<&str> {
        if self.is_failed() {
            return None;
        }
        self.columns.get(index).map(String::as_str)
    }

    pub fn binding_names(&self) -> &[String] {
        &self.columns
    }

    /// Moves the value of column `index` out of the current row.
    pub fn binding_value(&mut self, index: usize) -> Option<Node> {
        if self.is_failed() || self.columns.is_empty() {
            return None;
        }
        self.row.get_mut(index)?.take()
    }

    /// Moves the value of the first column labelled `name` out of the current row.
    pub fn binding_value_by_name(&mut self, name: &str) -> Option<Node> {
        let index = self.columns.iter().position(|column| column == name)?;
        self.binding_value(index)
    }

    /// Moves every live cell of the current row into `values` and returns the column names.
    ///
    /// `values` is left untouched when no row is current.
    pub fn bindings(&mut self, values: &mut [Option<Node>]) -> Result<&[String], Error> {
        if let Some(err) = self.failure_error() {
            return Err(err);
        }
        if self.columns.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("query result has no bindings"));
        }
        if self.state == QueryState::RowAvailable {
            for (value, cell) in values.iter_mut().zip(self.row.iter_mut()) {
                *value = cell.take();
            }
        }
        Ok(&self.columns)
    }

    pub fn is_bindings(&self) -> bool {
        self.has_shape(Shape::BINDINGS)
    }

    pub fn is_boolean(&self) -> bool {
        self.has_shape(Shape::BOOLEAN)
    }

    pub fn is_graph(&self) -> bool {
        self.has_shape(Shape::GRAPH)
    }

    pub fn is_syntax(&self) -> bool {
        self.has_shape(Shape::SYNTAX)
    }

    /// Reads the single row of a boolean result. The answer is cached.
    pub fn boolean(&mut self) -> Result<bool, Error> {
        if let Some(value) = self.boolean {
            return Ok(value);
        }
        self.ensure_usable()?;
        if !self.shape.contains(Shape::BOOLEAN) {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("query result is not boolean")
                .with_hint("Only ASK queries produce a boolean result."));
        }
        if self.columns.is_empty() {
            return Err(not_executed_error());
        }
        if self.state != QueryState::Executing {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("boolean result was already consumed"));
        }

        let value = if self.fetch_row()? {
            let Some(connection) = self.connection.as_deref_mut() else {
                return Err(closed_error());
            };
            match connection.int_cell(0) {
                Ok(cell) => {
                    self.rows_consumed += 1;
                    cell.is_some_and(|value| value != 0)
                }
                Err(diagnostic) => return Err(self.driver_failure("int_cell", diagnostic)),
            }
        } else {
            false
        };
        self.state = QueryState::Exhausted;
        self.boolean = Some(value);
        Ok(value)
    }

    /// Views a graph result as quads, starting with the current row unless an
    /// earlier stream already drained it.
    ///
    /// `None` unless the result is graph shaped with at least three columns.
    pub fn as_stream(&mut self) -> Option<QuadStream<'_>> {
        if self.is_failed() || !self.is_graph() || self.columns.len() < 3 {
            return None;
        }
        if self.state != QueryState::RowAvailable {
            return Some(QuadStream::empty());
        }
        // A row already drained by an abandoned stream is skipped, not re-read.
        let row_pending = self.row.iter().any(|cell| !cell.is_empty());
        Some(QuadStream::new(GraphRows::new(self, row_pending)))
    }

    /// Releases result buffers and the cursor, then returns the connection to its pool.
    ///
    /// Calling it again does nothing.
    pub fn terminate(&mut self) {
        if self.state == QueryState::Closed {
            return;
        }
        self.columns = Vec::new();
        self.row = Vec::new();
        self.shape = Shape::UNKNOWN;
        self.rows_consumed = 0;
        self.skipped = 0;
        self.boolean = None;
        self.failure = None;
        if let Some(mut connection) = self.connection.take() {
            if self.cursor_open {
                connection.close_cursor();
                self.cursor_open = false;
            }
            self.pool.release(connection);
        }
        self.text = String::new();
        self.base_uri = None;
        self.state = QueryState::Closed;
        debug!("terminated query context");
    }

    /// Fetches and decodes the next row, honouring offset and limit.
    pub(crate) fn advance(&mut self) -> Result<bool, Error> {
        self.clear_row();
        if self.limit.is_some_and(|limit| self.rows_consumed >= limit) {
            self.state = QueryState::Exhausted;
            return Ok(false);
        }
        while self.skipped < self.offset {
            if !self.fetch_row()? {
                self.state = QueryState::Exhausted;
                return Ok(false);
            }
            self.skipped += 1;
        }
        if !self.fetch_row()? {
            self.state = QueryState::Exhausted;
            return Ok(false);
        }
        self.decode_row()?;
        self.rows_consumed += 1;
        self.state = QueryState::RowAvailable;
        Ok(true)
    }

    pub(crate) fn row_mut(&mut self) -> &mut [NodeSlot] {
        &mut self.row
    }

    fn fetch_row(&mut self) -> Result<bool, Error> {
        let Some(connection) = self.connection.as_deref_mut() else {
            return Err(closed_error());
        };
        match connection.fetch() {
            Ok(Fetch::Row) => Ok(true),
            Ok(Fetch::NoData) => Ok(false),
            Err(diagnostic) => Err(self.driver_failure("fetch", diagnostic)),
        }
    }

    fn decode_row(&mut self) -> Result<(), Error> {
        for column in 0..self.columns.len() {
            let Some(connection) = self.connection.as_deref_mut() else {
                return Err(closed_error());
            };
            let cell = match connection.text_cell(column) {
                Ok(cell) => cell,
                Err(diagnostic) => return Err(self.driver_failure("text_cell", diagnostic)),
            };
            let node = match cell {
                Cell::Null => None,
                Cell::Unavailable => {
                    let message = format!("column `{}` returned no data", self.columns[column]);
                    return Err(self.fail(ErrorKind::Connection, message));
                }
                Cell::Text(text) => match connection.decode_node(column, &text) {
                    Some(node) => Some(node),
                    None => {
                        let message = format!(
                            "column `{}` value {text:?} is not a valid node",
                            self.columns[column]
                        );
                        return Err(self.fail(ErrorKind::Decode, message));
                    }
                },
            };
            self.row[column] = NodeSlot::new(node);
        }
        Ok(())
    }

    fn has_shape(&self, flag: Shape) -> bool {
        !self.columns.is_empty() && self.shape.contains(flag)
    }

    fn clear_row(&mut self) {
        for cell in &mut self.row {
            cell.clear();
        }
    }

    fn reset_results(&mut self) {
        if self.cursor_open {
            if let Some(connection) = self.connection.as_deref_mut() {
                connection.close_cursor();
            }
            self.cursor_open = false;
        }
        self.columns.clear();
        self.row.clear();
        self.skipped = 0;
        self.rows_consumed = 0;
        self.boolean = None;
    }

    fn ensure_usable(&self) -> Result<(), Error> {
        if let Some(err) = self.failure_error() {
            return Err(err);
        }
        if self.state == QueryState::Closed {
            return Err(closed_error());
        }
        Ok(())
    }

    fn failure_error(&self) -> Option<Error> {
        if self.state != QueryState::Failed {
            return None;
        }
        let failure = self.failure.as_ref()?;
        Some(Error::new(failure.kind).with_message(failure.message.clone()))
    }

    fn driver_failure(&mut self, call: &str, diagnostic: Diagnostic) -> Error {
        error!(
            call,
            state = %diagnostic.state,
            message = %diagnostic.message,
            "query driver call failed"
        );
        let message = format!("{call} failed: {diagnostic}");
        self.fail(ErrorKind::Connection, message).with_source(diagnostic)
    }

    fn fail(&mut self, kind: ErrorKind, message: String) -> Error {
        error!(kind = ?kind, %message, "query failed");
        self.clear_row();
        self.state = QueryState::Failed;
        self.failure = Some(Failure {
            kind,
            message: message.clone(),
        });
        Error::new(kind).with_message(message)
    }
}

impl Drop for QueryContext<'_> {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn closed_error() -> Error {
    Error::new(ErrorKind::Usage).with_message("query context is terminated")
}

fn not_executed_error() -> Error {
    Error::new(ErrorKind::Usage)
        .with_message("query has not been executed")
        .with_hint("Call `execute` before reading results.")
}
