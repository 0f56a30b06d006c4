//! Purpose: Define the stable public Rust API boundary for rdfstore.
//! Exports: Core types and operations needed by the CLI, backends and drivers.
//! Role: Public, additive-only surface over the storage and query modules.
//! Invariants: Items re-exported here keep their names across releases.
//! Invariants: Backend and driver implementations need nothing outside this module.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::backends::{hashes, list, register_builtin};
pub use crate::core::backend::{
    Backend, BackendDescriptor, CloneBackend, InitFn, ModelRef, Projector,
};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::node::{Node, NodeSlot};
pub use crate::core::options::Options;
pub use crate::core::projection::{ProjectionIter, project};
pub use crate::core::registry::Registry;
pub use crate::core::statement::{Axis, Pattern, Quad, Statement};
pub use crate::core::storage::{Lifecycle, Storage};
pub use crate::core::stream::{NodeIterator, QuadStream, StatementStream, Stream};
pub use crate::query::context::{QueryContext, QueryOptions, QueryState};
pub use crate::query::driver::{Cell, Connection, ConnectionPool, Diagnostic, Fetch};
pub use crate::query::format::results_json;
pub use crate::query::shape::{Shape, classify};
