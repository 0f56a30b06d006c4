//! Purpose: Serialise query results in the SPARQL 1.1 Query Results JSON form.
//! Exports: `QueryContext::write_json`, `results_json`.
//! Role: Output format shared by the CLI and library callers.
//! Invariants: Boolean results carry `boolean`; all others carry `head.vars` and `results.bindings`.
//! Invariants: Unbound cells are omitted from their binding object.

use std::io::Write;

use serde_json::{Map, Value, json};

use crate::core::error::{Error, ErrorKind};
use crate::core::node::Node;
use crate::query::context::{QueryContext, QueryState};

impl QueryContext<'_> {
    /// Consumes the remaining results and writes them to `writer` as one JSON document.
    pub fn write_json<W: Write>(&mut self, mut writer: W) -> Result<(), Error> {
        let value = results_json(self)?;
        serde_json::to_writer(&mut writer, &value).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write query results")
                .with_source(err)
        })?;
        writeln!(writer).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write query results")
                .with_source(err)
        })
    }
}

pub fn results_json(query: &mut QueryContext<'_>) -> Result<Value, Error> {
    if query.is_boolean() {
        let value = query.boolean()?;
        return Ok(json!({ "head": {}, "boolean": value }));
    }

    let vars = query.binding_names().to_vec();
    let mut bindings = Vec::new();
    if !vars.is_empty() {
        let mut values: Vec<Option<Node>> = vec![None; vars.len()];
        while query.state() == QueryState::RowAvailable {
            values.iter_mut().for_each(|value| *value = None);
            query.bindings(&mut values)?;
            bindings.push(binding_json(&vars, &mut values)?);
            query.next_row()?;
        }
        if query.is_failed() {
            // Surfaces the recorded failure.
            query.next_row()?;
        }
    }
    Ok(json!({
        "head": { "vars": vars },
        "results": { "bindings": bindings },
    }))
}

fn binding_json(vars: &[String], values: &mut [Option<Node>]) -> Result<Value, Error> {
    let mut object = Map::new();
    for (name, value) in vars.iter().zip(values.iter_mut()) {
        if let Some(node) = value.take() {
            let node = serde_json::to_value(&node).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode node")
                    .with_source(err)
            })?;
            object.insert(name.clone(), node);
        }
    }
    Ok(Value::Object(object))
}
