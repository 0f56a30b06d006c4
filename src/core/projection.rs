// Generic SOURCES/ARCS/TARGETS projection built on a backend's pattern match.
use tracing::debug;

use crate::core::backend::Backend;
use crate::core::error::Error;
use crate::core::node::Node;
use crate::core::statement::{Axis, Pattern};
use crate::core::stream::{NodeIterator, StatementStream};

/// Nodes at the wildcard position of `axis` among statements matching the two
/// known terms. Uses the backend's own projector when it has one.
pub fn project<'a>(
    backend: &'a dyn Backend,
    axis: Axis,
    first: &'a Node,
    second: &'a Node,
) -> Result<NodeIterator<'a>, Error> {
    if let Some(projector) = backend.projector(axis) {
        return projector.project(first, second);
    }

    debug!(%axis, "no specialized projection; scanning matches");
    let pattern = Pattern::with_known(axis, first, second);
    let stream = backend.find(&pattern)?;
    Ok(NodeIterator::new(ProjectionIter::new(stream, pattern, axis)))
}

/// Narrows a statement stream to the nodes on one axis.
///
/// Each pull moves the wildcard node out of the matched statement and drops
/// the rest of it. The pattern only borrows the known terms, so disposal
/// forgets it without touching caller-owned nodes.
#[derive(Debug)]
pub struct ProjectionIter<'a> {
    stream: StatementStream<'a>,
    pattern: Option<Pattern<'a>>,
    axis: Axis,
}

impl<'a> ProjectionIter<'a> {
    pub fn new(stream: StatementStream<'a>, pattern: Pattern<'a>, axis: Axis) -> Self {
        Self {
            stream,
            pattern: Some(pattern),
            axis,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn pattern(&self) -> Option<&Pattern<'a>> {
        self.pattern.as_ref()
    }

    pub fn dispose(&mut self) {
        self.pattern = None;
        self.stream.dispose();
    }
}

impl Iterator for ProjectionIter<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        loop {
            let mut statement = self.stream.next()?;
            if let Some(node) = statement.take(self.axis) {
                return Some(node);
            }
            debug!(axis = %self.axis, "matched statement has no node on axis; skipping");
        }
    }
}

impl Drop for ProjectionIter<'_> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::{ProjectionIter, project};
    use crate::backends::{hashes::HashStore, list::ListStore};
    use crate::core::backend::Backend;
    use crate::core::node::Node;
    use crate::core::statement::{Axis, Pattern, Statement};
    use crate::core::stream::StatementStream;
    use std::cell::Cell;

    fn uri(local: &str) -> Node {
        Node::uri(format!("http://ex/{local}"))
    }

    fn fill(backend: &mut dyn Backend) {
        let rows = [
            ("alice", "knows", "bob"),
            ("alice", "knows", "carol"),
            ("bob", "knows", "carol"),
            ("alice", "likes", "carol"),
            ("carol", "knows", "alice"),
        ];
        for (s, p, o) in rows {
            backend.add(Statement::new(uri(s), uri(p), uri(o))).expect("add");
        }
    }

    fn sorted(mut nodes: Vec<Node>) -> Vec<Node> {
        nodes.sort();
        nodes
    }

    #[test]
    fn generic_projection_yields_each_axis() {
        let mut store = ListStore::new("test", None);
        fill(&mut store);
        let (alice, knows, carol) = (uri("alice"), uri("knows"), uri("carol"));

        let sources: Vec<_> = project(&store, Axis::Sources, &knows, &carol)
            .expect("sources")
            .collect();
        assert_eq!(sorted(sources), vec![uri("alice"), uri("bob")]);

        let arcs: Vec<_> = project(&store, Axis::Arcs, &alice, &carol).expect("arcs").collect();
        assert_eq!(sorted(arcs), vec![uri("knows"), uri("likes")]);

        let targets: Vec<_> = project(&store, Axis::Targets, &alice, &knows)
            .expect("targets")
            .collect();
        assert_eq!(sorted(targets), vec![uri("bob"), uri("carol")]);
    }

    #[test]
    fn specialized_projection_matches_generic() {
        let mut indexed = HashStore::new("indexed", None);
        let mut plain = ListStore::new("plain", None);
        fill(&mut indexed);
        fill(&mut plain);
        let (alice, knows) = (uri("alice"), uri("knows"));

        assert!(indexed.projector(Axis::Targets).is_some());
        assert!(plain.projector(Axis::Targets).is_none());
        let fast: Vec<_> = project(&indexed, Axis::Targets, &alice, &knows)
            .expect("fast")
            .collect();
        let slow: Vec<_> = project(&plain, Axis::Targets, &alice, &knows)
            .expect("slow")
            .collect();
        assert_eq!(sorted(fast), sorted(slow));
    }

    #[test]
    fn dispose_twice_releases_stream_once() {
        let disposed = Cell::new(0);
        let statements = vec![Statement::new(uri("a"), uri("p"), uri("b"))];
        let stream = StatementStream::new(statements.into_iter())
            .with_dispose(|| disposed.set(disposed.get() + 1));
        let (p, b) = (uri("p"), uri("b"));
        let pattern = Pattern::with_known(Axis::Sources, &p, &b);
        let mut iter = ProjectionIter::new(stream, pattern, Axis::Sources);

        assert_eq!(iter.next(), Some(uri("a")));
        iter.dispose();
        iter.dispose();
        assert!(iter.pattern().is_none());
        assert_eq!(iter.next(), None);
        drop(iter);
        assert_eq!(disposed.get(), 1);
        assert_eq!(p, uri("p"));
    }

    #[test]
    fn statements_without_axis_node_are_skipped() {
        let statements = vec![
            Statement::partial(None, Some(uri("p")), Some(uri("o"))),
            Statement::new(uri("s"), uri("p"), uri("o")),
        ];
        let iter = ProjectionIter::new(
            StatementStream::new(statements.into_iter()),
            Pattern::any(),
            Axis::Sources,
        );
        assert_eq!(iter.collect::<Vec<_>>(), vec![uri("s")]);
    }
}
