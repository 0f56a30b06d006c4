// Name-to-descriptor registry owned by the application root.
use tracing::debug;

use crate::core::backend::BackendDescriptor;
use crate::core::error::{Error, ErrorKind};

/// Backend descriptors in registration order.
///
/// There is no process-wide instance; whoever bootstraps the application
/// builds one, registers backends, and hands out references.
#[derive(Debug, Default)]
pub struct Registry {
    descriptors: Vec<BackendDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend, panicking when `name` is already taken.
    ///
    /// A duplicate name is a build-time misconfiguration, not a runtime
    /// condition; use `try_register` to handle it as an error instead.
    pub fn register(&mut self, name: &str, build: impl FnOnce(&mut BackendDescriptor)) {
        if let Err(err) = self.try_register(name, build) {
            panic!("backend registration failed: {err}");
        }
    }

    pub fn try_register(
        &mut self,
        name: &str,
        build: impl FnOnce(&mut BackendDescriptor),
    ) -> Result<(), Error> {
        if self.find(name).is_some() {
            return Err(Error::new(ErrorKind::AlreadyExists)
                .with_message("backend already registered")
                .with_backend(name));
        }

        let mut descriptor = BackendDescriptor::blank(name);
        build(&mut descriptor);
        if !descriptor.has_init() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("backend builder did not set an initializer")
                .with_backend(name));
        }

        debug!(backend = name, "registered storage backend");
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// The named descriptor, or the first registered one when `name` is `None`.
    pub fn lookup(&self, name: Option<&str>) -> Option<&BackendDescriptor> {
        let found = match name {
            Some(name) => self.find(name),
            None => self.descriptors.first(),
        };
        if found.is_none() {
            debug!(backend = name.unwrap_or("<default>"), "no storage backend found");
        }
        found
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(BackendDescriptor::name)
    }

    pub fn descriptors(&self) -> &[BackendDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Releases every descriptor. Handles borrow the registry, so none can be alive here.
    pub fn teardown(&mut self) {
        debug!(count = self.descriptors.len(), "tearing down storage registry");
        self.descriptors.clear();
    }

    fn find(&self, name: &str) -> Option<&BackendDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::backends::list;
    use crate::core::error::ErrorKind;

    fn with_list(registry: &mut Registry, name: &str) {
        registry.register(name, |descriptor| {
            descriptor.set_init(list::init);
        });
    }

    #[test]
    fn lookup_by_name_and_default() {
        let mut registry = Registry::new();
        with_list(&mut registry, "first");
        with_list(&mut registry, "second");

        assert_eq!(registry.lookup(Some("second")).map(|d| d.name()), Some("second"));
        assert_eq!(registry.lookup(None).map(|d| d.name()), Some("first"));
        assert!(registry.lookup(Some("missing")).is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), ["first", "second"]);
    }

    #[test]
    fn empty_registry_has_no_default() {
        let registry = Registry::new();
        assert!(registry.lookup(None).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = Registry::new();
        with_list(&mut registry, "memory");
        let err = registry
            .try_register("memory", |descriptor| {
                descriptor.set_init(list::init);
            })
            .expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[should_panic(expected = "backend registration failed")]
    fn duplicate_register_panics() {
        let mut registry = Registry::new();
        with_list(&mut registry, "memory");
        with_list(&mut registry, "memory");
    }

    #[test]
    fn builder_must_set_initializer() {
        let mut registry = Registry::new();
        let err = registry
            .try_register("hollow", |descriptor| {
                descriptor.set_label("no init");
            })
            .expect_err("missing init");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(registry.lookup(Some("hollow")).is_none());
    }

    #[test]
    fn teardown_empties_registry() {
        let mut registry = Registry::new();
        with_list(&mut registry, "memory");
        registry.teardown();
        assert!(registry.lookup(None).is_none());
    }
}
