// Backend capability contract: required operations, optional projection and clone surfaces.
use std::fmt;

use crate::core::error::{Error, ErrorKind};
use crate::core::node::Node;
use crate::core::options::Options;
use crate::core::statement::{Axis, Pattern, Statement};
use crate::core::stream::{NodeIterator, StatementStream};

/// Identifies the model a storage session is opened on behalf of.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModelRef {
    name: String,
}

impl ModelRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Operations every storage backend provides.
///
/// The instance itself is the backend's private state; it is created by the
/// descriptor's initializer and dropped after `terminate`.
pub trait Backend {
    fn open(&mut self, model: Option<&ModelRef>) -> Result<(), Error>;

    fn close(&mut self) -> Result<(), Error>;

    fn size(&self) -> Result<usize, Error>;

    fn add(&mut self, statement: Statement) -> Result<(), Error>;

    fn add_many(&mut self, statements: StatementStream<'_>) -> Result<(), Error> {
        for statement in statements {
            self.add(statement)?;
        }
        Ok(())
    }

    fn remove(&mut self, statement: &Statement) -> Result<(), Error>;

    fn contains(&self, statement: &Statement) -> Result<bool, Error>;

    /// Every statement in the store.
    fn serialise(&self) -> Result<StatementStream<'_>, Error>;

    /// Statements matching `pattern`, each at most once.
    fn find(&self, pattern: &Pattern<'_>) -> Result<StatementStream<'_>, Error>;

    /// Index-backed projection for `axis`, when the backend has one.
    fn projector(&self, _axis: Axis) -> Option<&dyn Projector> {
        None
    }

    /// Clone support, when the backend can create an independent sibling.
    fn cloner(&self) -> Option<&dyn CloneBackend> {
        None
    }

    fn terminate(&mut self) {}
}

/// Specialized projection along one axis given the two known terms, in
/// statement order (subject, predicate, object) with the wildcard removed.
pub trait Projector {
    fn project<'s>(&'s self, first: &Node, second: &Node) -> Result<NodeIterator<'s>, Error>;
}

pub trait CloneBackend {
    /// Creates a new, independent storage in the same backend family and
    /// returns it with the identifier the backend chose for it.
    fn clone_backend(&self) -> Result<(String, Box<dyn Backend>), Error>;
}

pub type InitFn = fn(identifier: &str, options: Options) -> Result<Box<dyn Backend>, Error>;

/// A registered backend: its unique name plus the initializer that creates
/// instances. Filled in by the builder passed to `Registry::register`.
pub struct BackendDescriptor {
    name: String,
    label: Option<String>,
    init: Option<InitFn>,
}

impl BackendDescriptor {
    pub(crate) fn blank(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            init: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    pub fn set_init(&mut self, init: InitFn) -> &mut Self {
        self.init = Some(init);
        self
    }

    pub(crate) fn has_init(&self) -> bool {
        self.init.is_some()
    }

    pub(crate) fn instantiate(
        &self,
        identifier: &str,
        options: Options,
    ) -> Result<Box<dyn Backend>, Error> {
        let init = self.init.ok_or_else(|| {
            Error::new(ErrorKind::Internal)
                .with_message("backend has no initializer")
                .with_backend(&self.name)
        })?;
        init(identifier, options).map_err(|err| match err.backend() {
            Some(_) => err,
            None => err.with_backend(&self.name),
        })
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("init", &self.init.is_some())
            .finish()
    }
}
