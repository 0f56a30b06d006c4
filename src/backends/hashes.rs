// In-memory backend with one hash index per projection axis.
use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::backends::{check_insert, max_size};
use crate::core::backend::{Backend, ModelRef, Projector};
use crate::core::error::Error;
use crate::core::node::Node;
use crate::core::options::Options;
use crate::core::registry::Registry;
use crate::core::statement::{Axis, Pattern, Statement};
use crate::core::stream::{NodeIterator, StatementStream};

pub const NAME: &str = "hashes";

pub fn register(registry: &mut Registry) {
    registry.register(NAME, |descriptor| {
        descriptor
            .set_label("in-memory statements with per-axis hash indexes")
            .set_init(init);
    });
}

pub fn init(identifier: &str, options: Options) -> Result<Box<dyn Backend>, Error> {
    let max_size = max_size(&options)?;
    Ok(Box::new(HashStore::new(identifier, max_size)))
}

/// Nodes on one axis keyed by the two known terms, in statement order.
#[derive(Debug)]
pub struct AxisIndex {
    axis: Axis,
    entries: HashMap<(Node, Node), Vec<Node>>,
}

impl AxisIndex {
    fn new(axis: Axis) -> Self {
        Self {
            axis,
            entries: HashMap::new(),
        }
    }

    fn split(&self, statement: &Statement) -> Option<((Node, Node), Node)> {
        let (s, p, o) = (
            statement.subject()?.clone(),
            statement.predicate()?.clone(),
            statement.object()?.clone(),
        );
        Some(match self.axis {
            Axis::Sources => ((p, o), s),
            Axis::Arcs => ((s, o), p),
            Axis::Targets => ((s, p), o),
        })
    }

    fn insert(&mut self, statement: &Statement) {
        if let Some((key, node)) = self.split(statement) {
            self.entries.entry(key).or_default().push(node);
        }
    }

    fn remove(&mut self, statement: &Statement) {
        let Some((key, node)) = self.split(statement) else {
            return;
        };
        if let Some(nodes) = self.entries.get_mut(&key) {
            nodes.retain(|existing| *existing != node);
            if nodes.is_empty() {
                self.entries.remove(&key);
            }
        }
    }
}

impl Projector for AxisIndex {
    fn project<'s>(&'s self, first: &Node, second: &Node) -> Result<NodeIterator<'s>, Error> {
        let key = (first.clone(), second.clone());
        Ok(match self.entries.get(&key) {
            Some(nodes) => NodeIterator::new(nodes.iter().cloned()),
            None => NodeIterator::empty(),
        })
    }
}

#[derive(Debug)]
pub struct HashStore {
    identifier: String,
    statements: BTreeSet<Statement>,
    sources: AxisIndex,
    arcs: AxisIndex,
    targets: AxisIndex,
    max_size: Option<usize>,
}

impl HashStore {
    pub fn new(identifier: &str, max_size: Option<usize>) -> Self {
        Self {
            identifier: identifier.to_string(),
            statements: BTreeSet::new(),
            sources: AxisIndex::new(Axis::Sources),
            arcs: AxisIndex::new(Axis::Arcs),
            targets: AxisIndex::new(Axis::Targets),
            max_size,
        }
    }

    fn indexes_mut(&mut self) -> [&mut AxisIndex; 3] {
        [&mut self.sources, &mut self.arcs, &mut self.targets]
    }
}

impl Backend for HashStore {
    fn open(&mut self, model: Option<&ModelRef>) -> Result<(), Error> {
        debug!(
            identifier = %self.identifier,
            model = model.map(ModelRef::name),
            "opened hashes storage"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn size(&self) -> Result<usize, Error> {
        Ok(self.statements.len())
    }

    fn add(&mut self, statement: Statement) -> Result<(), Error> {
        if self.statements.contains(&statement) {
            return Ok(());
        }
        check_insert(&statement, self.statements.len(), self.max_size)?;
        for index in self.indexes_mut() {
            index.insert(&statement);
        }
        self.statements.insert(statement);
        Ok(())
    }

    fn remove(&mut self, statement: &Statement) -> Result<(), Error> {
        if self.statements.remove(statement) {
            for index in self.indexes_mut() {
                index.remove(statement);
            }
        }
        Ok(())
    }

    fn contains(&self, statement: &Statement) -> Result<bool, Error> {
        Ok(self.statements.contains(statement))
    }

    fn serialise(&self) -> Result<StatementStream<'_>, Error> {
        Ok(StatementStream::new(self.statements.iter().cloned()))
    }

    fn find(&self, pattern: &Pattern<'_>) -> Result<StatementStream<'_>, Error> {
        let wanted = pattern.to_statement();
        if wanted.is_complete() {
            let found = self.statements.get(&wanted).cloned();
            return Ok(StatementStream::new(found.into_iter()));
        }
        Ok(StatementStream::new(
            self.statements
                .iter()
                .filter(move |statement| wanted.as_pattern().matches(statement))
                .cloned(),
        ))
    }

    fn projector(&self, axis: Axis) -> Option<&dyn Projector> {
        let index: &dyn Projector = match axis {
            Axis::Sources => &self.sources,
            Axis::Arcs => &self.arcs,
            Axis::Targets => &self.targets,
        };
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::HashStore;
    use crate::core::backend::Backend;
    use crate::core::node::Node;
    use crate::core::statement::{Axis, Pattern, Statement};

    fn uri(local: &str) -> Node {
        Node::uri(format!("http://ex/{local}"))
    }

    #[test]
    fn indexes_follow_removals() {
        let mut store = HashStore::new("idx", None);
        let statement = Statement::new(uri("a"), uri("p"), uri("b"));
        store.add(statement.clone()).expect("add");
        store.add(Statement::new(uri("c"), uri("p"), uri("b"))).expect("add");

        let (p, b) = (uri("p"), uri("b"));
        let projector = store.projector(Axis::Sources).expect("projector");
        assert_eq!(projector.project(&p, &b).expect("project").count(), 2);

        store.remove(&statement).expect("remove");
        let projector = store.projector(Axis::Sources).expect("projector");
        let remaining: Vec<_> = projector.project(&p, &b).expect("project").collect();
        assert_eq!(remaining, vec![uri("c")]);
    }

    #[test]
    fn unknown_key_projects_nothing() {
        let store = HashStore::new("empty", None);
        let (a, b) = (uri("a"), uri("b"));
        let projector = store.projector(Axis::Arcs).expect("projector");
        assert_eq!(projector.project(&a, &b).expect("project").count(), 0);
    }

    #[test]
    fn fully_bound_find_is_a_lookup() {
        let mut store = HashStore::new("lookup", None);
        let statement = Statement::new(uri("a"), uri("p"), Node::literal("v"));
        store.add(statement.clone()).expect("add");

        let found: Vec<_> = store.find(&statement.as_pattern()).expect("find").collect();
        assert_eq!(found, vec![statement.clone()]);

        let other = Node::literal("w");
        let miss = Pattern { object: Some(&other), ..statement.as_pattern() };
        assert_eq!(store.find(&miss).expect("find").count(), 0);
    }

    #[test]
    fn clone_is_unsupported() {
        let store = HashStore::new("no-clone", None);
        assert!(store.cloner().is_none());
    }
}
