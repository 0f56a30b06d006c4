// Storage handle: one open association between a backend descriptor and its instance.
use std::fmt;

use tracing::debug;

use crate::core::backend::{Backend, BackendDescriptor, ModelRef};
use crate::core::error::{Error, ErrorKind};
use crate::core::node::Node;
use crate::core::options::Options;
use crate::core::projection;
use crate::core::registry::Registry;
use crate::core::statement::{Axis, Pattern, Statement};
use crate::core::stream::{NodeIterator, StatementStream};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lifecycle {
    Created,
    Open,
    Closed,
}

/// Exclusive handle on one backend instance.
///
/// A handle exists only once its backend initialized successfully; dropping
/// it terminates the backend and then releases the instance.
pub struct Storage<'r> {
    descriptor: &'r BackendDescriptor,
    identifier: String,
    backend: Box<dyn Backend>,
    lifecycle: Lifecycle,
}

impl<'r> Storage<'r> {
    /// Looks up `backend` (or the default backend) and creates a storage
    /// from a flattened option string.
    pub fn new(
        registry: &'r Registry,
        backend: Option<&str>,
        identifier: &str,
        options: Option<&str>,
    ) -> Result<Self, Error> {
        let descriptor = registry.lookup(backend).ok_or_else(|| {
            let err = Error::new(ErrorKind::NotFound).with_message("storage backend not found");
            match backend {
                Some(name) => err.with_backend(name),
                None => err.with_hint("Register at least one backend before creating storage."),
            }
        })?;
        let options = Options::parse(options.unwrap_or_default())?;
        Self::from_descriptor(Some(descriptor), identifier, options)
    }

    /// Creates a storage from a descriptor. The options are consumed whether
    /// or not initialization succeeds.
    pub fn from_descriptor(
        descriptor: Option<&'r BackendDescriptor>,
        identifier: &str,
        options: Options,
    ) -> Result<Self, Error> {
        let Some(descriptor) = descriptor else {
            return Err(Error::new(ErrorKind::NotFound).with_message("no backend descriptor given"));
        };
        let backend = descriptor.instantiate(identifier, options)?;
        debug!(backend = descriptor.name(), identifier, "created storage");
        Ok(Self {
            descriptor,
            identifier: identifier.to_string(),
            backend,
            lifecycle: Lifecycle::Created,
        })
    }

    /// Creates a new, independent storage of the same backend family under an
    /// identifier chosen by the backend.
    ///
    /// A backend without clone support yields `ErrorKind::Unsupported` rather
    /// than aborting.
    pub fn duplicate(&self) -> Result<Storage<'r>, Error> {
        let cloner = self.backend.cloner().ok_or_else(|| {
            Error::new(ErrorKind::Unsupported)
                .with_message("clone not implemented for backend")
                .with_backend(self.descriptor.name())
        })?;
        let (identifier, backend) = cloner.clone_backend()?;
        // The new handle is bound to the descriptor only after the clone succeeded.
        debug!(
            backend = self.descriptor.name(),
            from = %self.identifier,
            to = %identifier,
            "cloned storage"
        );
        Ok(Storage {
            descriptor: self.descriptor,
            identifier,
            backend,
            lifecycle: Lifecycle::Created,
        })
    }

    pub fn descriptor(&self) -> &'r BackendDescriptor {
        self.descriptor
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn supports_clone(&self) -> bool {
        self.backend.cloner().is_some()
    }

    /// True when the backend answers `axis` projections itself.
    pub fn has_projector(&self, axis: Axis) -> bool {
        self.backend.projector(axis).is_some()
    }

    pub fn open(&mut self, model: Option<&ModelRef>) -> Result<(), Error> {
        if self.lifecycle == Lifecycle::Open {
            return Err(self.usage("storage is already open"));
        }
        self.backend.open(model)?;
        self.lifecycle = Lifecycle::Open;
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), Error> {
        if self.lifecycle != Lifecycle::Open {
            return Err(self.usage("storage is not open"));
        }
        let result = self.backend.close();
        self.lifecycle = Lifecycle::Closed;
        result
    }

    pub fn size(&self) -> Result<usize, Error> {
        self.backend.size()
    }

    pub fn add(&mut self, statement: Statement) -> Result<(), Error> {
        self.backend.add(statement)
    }

    pub fn add_many(&mut self, statements: StatementStream<'_>) -> Result<(), Error> {
        self.backend.add_many(statements)
    }

    pub fn remove(&mut self, statement: &Statement) -> Result<(), Error> {
        self.backend.remove(statement)
    }

    pub fn contains(&self, statement: &Statement) -> Result<bool, Error> {
        self.backend.contains(statement)
    }

    pub fn serialise(&self) -> Result<StatementStream<'_>, Error> {
        self.backend.serialise()
    }

    pub fn find(&self, pattern: &Pattern<'_>) -> Result<StatementStream<'_>, Error> {
        self.backend.find(pattern)
    }

    pub fn projection<'a>(
        &'a self,
        axis: Axis,
        first: &'a Node,
        second: &'a Node,
    ) -> Result<NodeIterator<'a>, Error> {
        projection::project(self.backend.as_ref(), axis, first, second)
    }

    /// Subjects of statements with predicate `arc` and object `target`.
    pub fn sources<'a>(
        &'a self,
        arc: &'a Node,
        target: &'a Node,
    ) -> Result<NodeIterator<'a>, Error> {
        self.projection(Axis::Sources, arc, target)
    }

    /// Predicates of statements with subject `source` and object `target`.
    pub fn arcs<'a>(
        &'a self,
        source: &'a Node,
        target: &'a Node,
    ) -> Result<NodeIterator<'a>, Error> {
        self.projection(Axis::Arcs, source, target)
    }

    /// Objects of statements with subject `source` and predicate `arc`.
    pub fn targets<'a>(
        &'a self,
        source: &'a Node,
        arc: &'a Node,
    ) -> Result<NodeIterator<'a>, Error> {
        self.projection(Axis::Targets, source, arc)
    }

    fn usage(&self, message: &str) -> Error {
        Error::new(ErrorKind::Usage)
            .with_message(message)
            .with_backend(self.descriptor.name())
    }
}

impl fmt::Debug for Storage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("backend", &self.descriptor.name())
            .field("identifier", &self.identifier)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

impl Drop for Storage<'_> {
    fn drop(&mut self) {
        self.backend.terminate();
        debug!(
            backend = self.descriptor.name(),
            identifier = %self.identifier,
            "destroyed storage"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{Lifecycle, Storage};
    use crate::backends;
    use crate::core::backend::ModelRef;
    use crate::core::error::ErrorKind;
    use crate::core::node::Node;
    use crate::core::options::Options;
    use crate::core::registry::Registry;
    use crate::core::statement::{Pattern, Statement};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        backends::register_builtin(&mut registry);
        registry
    }

    fn triple(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(Node::uri(s), Node::uri(p), Node::literal(o))
    }

    #[test]
    fn lifecycle_open_close() {
        let registry = registry();
        let mut storage = Storage::new(&registry, None, "test", None).expect("storage");
        assert_eq!(storage.descriptor().name(), "list");
        assert_eq!(storage.lifecycle(), Lifecycle::Created);

        storage.open(Some(&ModelRef::new("m"))).expect("open");
        assert_eq!(storage.open(None).expect_err("reopen").kind(), ErrorKind::Usage);
        storage.close().expect("close");
        assert_eq!(storage.lifecycle(), Lifecycle::Closed);
        assert_eq!(storage.close().expect_err("close twice").kind(), ErrorKind::Usage);
    }

    #[test]
    fn unknown_backend_is_not_found() {
        let registry = registry();
        let err = Storage::new(&registry, Some("bdb"), "x", None).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.backend(), Some("bdb"));

        let err = Storage::from_descriptor(None, "x", Options::new()).expect_err("none");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn malformed_options_fail_creation() {
        let registry = registry();
        let err = Storage::new(&registry, Some("hashes"), "x", Some("max-size='3"))
            .expect_err("bad options");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn delegates_triple_operations() {
        let registry = registry();
        let mut storage = Storage::new(&registry, Some("hashes"), "ops", None).expect("storage");
        let first = triple("http://ex/a", "http://ex/p", "one");
        let second = triple("http://ex/a", "http://ex/p", "two");

        storage.add(first.clone()).expect("add");
        storage.add(second.clone()).expect("add");
        assert_eq!(storage.size().expect("size"), 2);
        assert!(storage.contains(&first).expect("contains"));

        storage.remove(&first).expect("remove");
        assert!(!storage.contains(&first).expect("contains"));
        assert_eq!(storage.serialise().expect("serialise").count(), 1);

        let a = Node::uri("http://ex/a");
        let pattern = Pattern { subject: Some(&a), ..Pattern::any() };
        let found: Vec<_> = storage.find(&pattern).expect("find").collect();
        assert_eq!(found, vec![second]);
    }

    #[test]
    fn add_many_copies_between_storages() {
        let registry = registry();
        let mut source = Storage::new(&registry, Some("list"), "src", None).expect("src");
        source.add(triple("http://ex/a", "http://ex/p", "x")).expect("add");
        source.add(triple("http://ex/b", "http://ex/p", "y")).expect("add");

        let mut target = Storage::new(&registry, Some("hashes"), "dst", None).expect("dst");
        target
            .add_many(source.serialise().expect("serialise"))
            .expect("add many");
        assert_eq!(target.size().expect("size"), 2);
    }

    #[test]
    fn duplicate_requires_clone_support() {
        let registry = registry();
        let hashes = Storage::new(&registry, Some("hashes"), "h", None).expect("hashes");
        let err = hashes.duplicate().err().expect("unsupported");
        assert_eq!(err.kind(), ErrorKind::Unsupported);

        let mut list = Storage::new(&registry, Some("list"), "l", None).expect("list");
        list.add(triple("http://ex/a", "http://ex/p", "x")).expect("add");
        let copy = list.duplicate().expect("clone");
        assert!(copy.identifier().starts_with("l-copy-"));
        assert_ne!(copy.identifier(), list.identifier());
        assert_eq!(copy.size().expect("size"), 1);

        list.add(triple("http://ex/b", "http://ex/p", "y")).expect("add");
        assert_eq!(copy.size().expect("size"), 1);
    }

    #[test]
    fn named_projections() {
        let registry = registry();
        let mut storage = Storage::new(&registry, Some("list"), "p", None).expect("storage");
        storage.add(triple("http://ex/a", "http://ex/p", "x")).expect("add");
        let (a, p, x) = (Node::uri("http://ex/a"), Node::uri("http://ex/p"), Node::literal("x"));

        assert_eq!(storage.sources(&p, &x).expect("sources").collect::<Vec<_>>(), vec![a.clone()]);
        assert_eq!(storage.arcs(&a, &x).expect("arcs").collect::<Vec<_>>(), vec![p.clone()]);
        assert_eq!(storage.targets(&a, &p).expect("targets").collect::<Vec<_>>(), vec![x.clone()]);
    }
}
