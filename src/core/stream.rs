// Lazy, forward-only sequences with idempotent disposal.
use std::fmt;

use crate::core::node::Node;
use crate::core::statement::{Quad, Statement};

pub type StatementStream<'a> = Stream<'a, Statement>;
pub type NodeIterator<'a> = Stream<'a, Node>;
pub type QuadStream<'a> = Stream<'a, Quad>;

/// A non-restartable sequence that owns its source until disposed.
///
/// Disposal runs at most once, either through `dispose` or on drop, and
/// releases the source before invoking any registered disposal hook.
pub struct Stream<'a, T> {
    source: Option<Box<dyn Iterator<Item = T> + 'a>>,
    peeked: Option<T>,
    on_dispose: Option<Box<dyn FnOnce() + 'a>>,
    disposed: bool,
}

impl<'a, T> Stream<'a, T> {
    pub fn new<I>(source: I) -> Self
    where
        I: Iterator<Item = T> + 'a,
    {
        Self {
            source: Some(Box::new(source)),
            peeked: None,
            on_dispose: None,
            disposed: false,
        }
    }

    pub fn empty() -> Self {
        Self {
            source: None,
            peeked: None,
            on_dispose: None,
            disposed: false,
        }
    }

    /// Registers a hook that runs once when the stream is disposed.
    pub fn with_dispose(mut self, hook: impl FnOnce() + 'a) -> Self {
        self.on_dispose = Some(Box::new(hook));
        self
    }

    /// True when no further element will be produced.
    ///
    /// Answering may pull one element from the source; it is kept and handed
    /// out by the next call to `next`.
    pub fn is_end(&mut self) -> bool {
        if self.peeked.is_some() {
            return false;
        }
        self.peeked = self.pull();
        self.peeked.is_none()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.peeked = None;
        self.source = None;
        if let Some(hook) = self.on_dispose.take() {
            hook();
        }
    }

    fn pull(&mut self) -> Option<T> {
        let source = self.source.as_mut()?;
        match source.next() {
            Some(item) => Some(item),
            None => {
                self.source = None;
                None
            }
        }
    }
}

impl<T> Iterator for Stream<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let Some(item) = self.peeked.take() {
            return Some(item);
        }
        self.pull()
    }
}

impl<T> Drop for Stream<'_, T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T> fmt::Debug for Stream<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("exhausted", &(self.source.is_none() && self.peeked.is_none()))
            .field("disposed", &self.disposed)
            .finish()
    }
}
