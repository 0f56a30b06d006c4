//! Purpose: Bundled in-memory storage backends.
//! Exports: `register_builtin`, `list` (unindexed), `hashes` (per-axis indexes).
//! Role: Default backends for the CLI and reference implementations of the backend contract.
//! Invariants: `list` registers first and is therefore the default backend.
//! Invariants: Stores hold complete statements only, each at most once.

pub mod hashes;
pub mod list;

use getrandom::fill as fill_random;

use crate::core::error::{Error, ErrorKind};
use crate::core::options::Options;
use crate::core::registry::Registry;
use crate::core::statement::Statement;

pub fn register_builtin(registry: &mut Registry) {
    list::register(registry);
    hashes::register(registry);
}

/// `max-size` caps the number of stored statements; `contexts` is accepted for
/// compatibility and ignored.
pub(crate) fn max_size(options: &Options) -> Result<Option<usize>, Error> {
    options.get_bool("contexts")?;
    options.get_usize("max-size")
}

pub(crate) fn check_insert(
    statement: &Statement,
    current: usize,
    max_size: Option<usize>,
) -> Result<(), Error> {
    if !statement.is_complete() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("statement must bind subject, predicate and object"));
    }
    if let Some(max) = max_size {
        if current >= max {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("storage is full ({max} statements)"))
                .with_hint("Raise the max-size option or remove statements first."));
        }
    }
    Ok(())
}

pub(crate) fn clone_identifier(identifier: &str) -> Result<String, Error> {
    let mut bytes = [0u8; 4];
    fill_random(&mut bytes).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("failed to generate clone identifier: {err}"))
    })?;
    let suffix: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    Ok(format!("{identifier}-copy-{suffix}"))
}
