// Unindexed in-memory backend; every lookup scans the statement list.
use tracing::debug;

use crate::backends::{check_insert, clone_identifier, max_size};
use crate::core::backend::{Backend, CloneBackend, ModelRef};
use crate::core::error::Error;
use crate::core::options::Options;
use crate::core::registry::Registry;
use crate::core::statement::{Pattern, Statement};
use crate::core::stream::StatementStream;

pub const NAME: &str = "list";

pub fn register(registry: &mut Registry) {
    registry.register(NAME, |descriptor| {
        descriptor
            .set_label("unindexed in-memory statement list")
            .set_init(init);
    });
}

pub fn init(identifier: &str, options: Options) -> Result<Box<dyn Backend>, Error> {
    let max_size = max_size(&options)?;
    Ok(Box::new(ListStore::new(identifier, max_size)))
}

#[derive(Clone, Debug)]
pub struct ListStore {
    identifier: String,
    statements: Vec<Statement>,
    max_size: Option<usize>,
}

impl ListStore {
    pub fn new(identifier: &str, max_size: Option<usize>) -> Self {
        Self {
            identifier: identifier.to_string(),
            statements: Vec::new(),
            max_size,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl Backend for ListStore {
    fn open(&mut self, model: Option<&ModelRef>) -> Result<(), Error> {
        debug!(
            identifier = %self.identifier,
            model = model.map(ModelRef::name),
            "opened list storage"
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
        self.statements.push(statement);
        Ok(())
    }

    fn remove(&mut self, statement: &Statement) -> Result<(), Error> {
        self.statements.retain(|existing| existing != statement);
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
        Ok(StatementStream::new(
            self.statements
                .iter()
                .filter(move |statement| wanted.as_pattern().matches(statement))
                .cloned(),
        ))
    }

    fn cloner(&self) -> Option<&dyn CloneBackend> {
        Some(self)
    }
}

impl CloneBackend for ListStore {
    fn clone_backend(&self) -> Result<(String, Box<dyn Backend>), Error> {
        let identifier = clone_identifier(&self.identifier)?;
        let copy = ListStore {
            identifier: identifier.clone(),
            ..self.clone()
        };
        Ok((identifier, Box::new(copy)))
    }
}
