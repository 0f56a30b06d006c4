//! Purpose: Hold top-level CLI command dispatch for `rdfstore`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every storage created here is dropped before dispatch returns.
//! Invariants: Helpers in `main.rs` remain the source of term and JSON formatting.

use super::*;
use rdfstore::api::{Pattern, Shape, classify};

pub(super) fn dispatch_command(
    command: Command,
    target: &StorageTarget,
    registry: &Registry,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "rdfstore", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Backends => {
            let default = registry.lookup(None).map(|descriptor| descriptor.name().to_string());
            let mut backends = Vec::with_capacity(registry.len());
            for descriptor in registry.descriptors() {
                let probe = Storage::new(registry, Some(descriptor.name()), "probe", None)?;
                let projections = Axis::ALL
                    .iter()
                    .filter(|axis| probe.has_projector(**axis))
                    .map(|axis| axis.as_str())
                    .collect::<Vec<_>>();
                backends.push(json!({
                    "name": descriptor.name(),
                    "label": descriptor.label(),
                    "default": default.as_deref() == Some(descriptor.name()),
                    "clone": probe.supports_clone(),
                    "projections": projections,
                }));
            }
            emit_json(json!({ "backends": backends }));
            Ok(RunOutcome::ok())
        }
        Command::Smoke => {
            let mut storage = target.create(registry)?;
            let mut lifecycle = vec![format!("{:?}", storage.lifecycle())];
            storage.open(None)?;
            lifecycle.push(format!("{:?}", storage.lifecycle()));
            let size = storage.size()?;
            storage.close()?;
            lifecycle.push(format!("{:?}", storage.lifecycle()));
            emit_json(json!({
                "smoke": {
                    "backend": storage.descriptor().name(),
                    "identifier": storage.identifier(),
                    "lifecycle": lifecycle,
                    "size": size,
                }
            }));
            Ok(RunOutcome::ok())
        }
        Command::Find {
            data,
            subject,
            predicate,
            object,
        } => {
            let mut storage = target.create(registry)?;
            storage.open(None)?;
            load_dataset(&mut storage, &data)?;
            let subject = subject.as_deref().map(parse_term);
            let predicate = predicate.as_deref().map(parse_term);
            let object = object.as_deref().map(parse_term);
            let pattern = Pattern {
                subject: subject.as_ref(),
                predicate: predicate.as_ref(),
                object: object.as_ref(),
            };
            let statements = storage
                .find(&pattern)?
                .map(|statement| statement_json(&statement))
                .collect::<Vec<_>>();
            storage.close()?;
            emit_json(json!({
                "count": statements.len(),
                "statements": statements,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Project {
            data,
            axis,
            first,
            second,
        } => {
            let axis = Axis::from(axis);
            let mut storage = target.create(registry)?;
            storage.open(None)?;
            load_dataset(&mut storage, &data)?;
            let (first, second) = (parse_term(&first), parse_term(&second));
            let nodes = storage
                .projection(axis, &first, &second)?
                .map(|node| node_json(&node))
                .collect::<Vec<_>>();
            storage.close()?;
            emit_json(json!({
                "axis": axis.as_str(),
                "specialized": storage.has_projector(axis),
                "nodes": nodes,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Classify { text } => {
            let shape = classify(&text);
            emit_json(json!({
                "shape": shape.to_string(),
                "bindings": shape.contains(Shape::BINDINGS),
                "boolean": shape.contains(Shape::BOOLEAN),
                "graph": shape.contains(Shape::GRAPH),
                "deferred": shape.is_unknown(),
            }));
            Ok(RunOutcome::ok())
        }
    }
}
