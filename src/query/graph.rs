// Graph results read as quads using the fixed [graph?, subject, predicate, object] column layout.
use tracing::{debug, warn};

use crate::core::node::NodeSlot;
use crate::core::statement::{Quad, Statement};
use crate::query::context::QueryContext;

/// Pulls one result row per quad from a graph-shaped query.
///
/// When `row_pending` is set the first quad comes from the row the context
/// already holds; every other pull performs one fetch and decode cycle. A
/// row that cannot supply all three statement terms ends the sequence.
pub(crate) struct GraphRows<'q, 'p> {
    query: &'q mut QueryContext<'p>,
    row_pending: bool,
    finished: bool,
}

impl<'q, 'p> GraphRows<'q, 'p> {
    pub(crate) fn new(query: &'q mut QueryContext<'p>, row_pending: bool) -> Self {
        Self {
            query,
            row_pending,
            finished: false,
        }
    }
}

impl Iterator for GraphRows<'_, '_> {
    type Item = Quad;

    fn next(&mut self) -> Option<Quad> {
        if self.finished {
            return None;
        }
        if !self.row_pending {
            match self.query.advance() {
                Ok(true) => {}
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(err) => {
                    warn!(%err, "graph result stopped on a failed row");
                    self.finished = true;
                    return None;
                }
            }
        }
        self.row_pending = false;
        let quad = quad_from_row(self.query.row_mut());
        if quad.is_none() {
            debug!("graph row is missing a statement term; ending graph result");
            self.finished = true;
        }
        quad
    }
}

/// Moves a quad out of `row`. A leading graph column is present iff the row
/// has more than three cells; an empty graph cell yields an ungraphed quad.
pub(crate) fn quad_from_row(row: &mut [NodeSlot]) -> Option<Quad> {
    if row.len() < 3 {
        return None;
    }
    let mut cells = row.iter_mut();
    let graph = if row_has_graph(cells.len()) {
        cells.next().and_then(NodeSlot::take)
    } else {
        None
    };
    let subject = cells.next()?.take()?;
    let predicate = cells.next()?.take()?;
    let object = cells.next()?.take()?;
    Some(Quad {
        statement: Statement::new(subject, predicate, object),
        graph,
    })
}

fn row_has_graph(columns: usize) -> bool {
    columns > 3
}

#[cfg(test)]
mod tests {
    use super::quad_from_row;
    use crate::core::node::{Node, NodeSlot};

    fn cells(values: &[Option<&str>]) -> Vec<NodeSlot> {
        values
            .iter()
            .map(|value| NodeSlot::new(value.map(Node::uri)))
            .collect()
    }

    #[test]
    fn leading_graph_column_annotates_the_quad() {
        let mut row = cells(&[Some("g"), Some("s"), Some("p"), Some("o")]);
        let quad = quad_from_row(&mut row).expect("quad");
        assert_eq!(quad.graph, Some(Node::uri("g")));
        assert_eq!(quad.statement.subject(), Some(&Node::uri("s")));
        assert_eq!(quad.statement.object(), Some(&Node::uri("o")));
        assert!(row.iter().all(NodeSlot::is_empty));
    }

    #[test]
    fn three_columns_are_ungraphed() {
        let mut row = cells(&[Some("s"), Some("p"), Some("o")]);
        let quad = quad_from_row(&mut row).expect("quad");
        assert_eq!(quad.graph, None);
        assert_eq!(quad.statement.predicate(), Some(&Node::uri("p")));
    }

    #[test]
    fn short_or_partial_rows_yield_nothing() {
        assert!(quad_from_row(&mut cells(&[Some("s"), Some("p")])).is_none());
        assert!(quad_from_row(&mut cells(&[Some("s"), None, Some("o")])).is_none());
        assert!(quad_from_row(&mut cells(&[Some("g"), Some("s"), Some("p"), None])).is_none());
    }

    #[test]
    fn extraction_is_take_once() {
        let mut row = cells(&[Some("s"), Some("p"), Some("o")]);
        assert!(quad_from_row(&mut row).is_some());
        assert!(quad_from_row(&mut row).is_none());
    }

    #[test]
    fn empty_graph_cell_is_allowed() {
        let mut row = cells(&[None, Some("s"), Some("p"), Some("o")]);
        let quad = quad_from_row(&mut row).expect("quad");
        assert_eq!(quad.graph, None);
    }
}
