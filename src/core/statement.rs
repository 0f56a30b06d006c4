// Statements, borrowed triple patterns, and the projection axes over them.
use std::fmt;

use crate::core::node::{Node, NodeSlot};

/// The wildcard position a projection solves for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Axis {
    /// Subject unknown.
    Sources,
    /// Predicate unknown.
    Arcs,
    /// Object unknown.
    Targets,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Sources, Axis::Arcs, Axis::Targets];

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Sources => "sources",
            Axis::Arcs => "arcs",
            Axis::Targets => "targets",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three node slots; an empty slot acts as a wildcard when used for matching.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Statement {
    subject: NodeSlot,
    predicate: NodeSlot,
    object: NodeSlot,
}

impl Statement {
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    pub fn partial(subject: Option<Node>, predicate: Option<Node>, object: Option<Node>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    pub fn subject(&self) -> Option<&Node> {
        self.subject.get()
    }

    pub fn predicate(&self) -> Option<&Node> {
        self.predicate.get()
    }

    pub fn object(&self) -> Option<&Node> {
        self.object.get()
    }

    pub fn take_subject(&mut self) -> Option<Node> {
        self.subject.take()
    }

    pub fn take_predicate(&mut self) -> Option<Node> {
        self.predicate.take()
    }

    pub fn take_object(&mut self) -> Option<Node> {
        self.object.take()
    }

    /// Moves the node at the wildcard position of `axis` out of the statement.
    pub fn take(&mut self, axis: Axis) -> Option<Node> {
        match axis {
            Axis::Sources => self.subject.take(),
            Axis::Arcs => self.predicate.take(),
            Axis::Targets => self.object.take(),
        }
    }

    pub fn set_subject(&mut self, node: Node) -> Option<Node> {
        self.subject.put(node)
    }

    pub fn set_predicate(&mut self, node: Node) -> Option<Node> {
        self.predicate.put(node)
    }

    pub fn set_object(&mut self, node: Node) -> Option<Node> {
        self.object.put(node)
    }

    /// True when subject, predicate and object are all present.
    pub fn is_complete(&self) -> bool {
        !self.subject.is_empty() && !self.predicate.is_empty() && !self.object.is_empty()
    }

    pub fn clear(&mut self) {
        self.subject.clear();
        self.predicate.clear();
        self.object.clear();
    }

    pub fn as_pattern(&self) -> Pattern<'_> {
        Pattern {
            subject: self.subject.get(),
            predicate: self.predicate.get(),
            object: self.object.get(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}, {}, {}}}",
            DisplaySlot(self.subject.get()),
            DisplaySlot(self.predicate.get()),
            DisplaySlot(self.object.get())
        )
    }
}

struct DisplaySlot<'a>(Option<&'a Node>);

impl fmt::Display for DisplaySlot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(node) => write!(f, "{node}"),
            None => f.write_str("?"),
        }
    }
}

/// A triple filter borrowing its bound terms from the caller.
///
/// Unbound positions match anything. Because the terms are borrowed, nothing
/// that consumes a pattern can release a caller-owned node.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Pattern<'a> {
    pub subject: Option<&'a Node>,
    pub predicate: Option<&'a Node>,
    pub object: Option<&'a Node>,
}

impl<'a> Pattern<'a> {
    pub fn any() -> Self {
        Self::default()
    }

    /// Places the two known terms around the wildcard position of `axis`.
    pub fn with_known(axis: Axis, first: &'a Node, second: &'a Node) -> Self {
        match axis {
            Axis::Sources => Self {
                subject: None,
                predicate: Some(first),
                object: Some(second),
            },
            Axis::Arcs => Self {
                subject: Some(first),
                predicate: None,
                object: Some(second),
            },
            Axis::Targets => Self {
                subject: Some(first),
                predicate: Some(second),
                object: None,
            },
        }
    }

    pub fn bound_count(&self) -> usize {
        [self.subject, self.predicate, self.object]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    pub fn matches(&self, statement: &Statement) -> bool {
        slot_matches(self.subject, statement.subject())
            && slot_matches(self.predicate, statement.predicate())
            && slot_matches(self.object, statement.object())
    }

    /// Owned copy of the pattern for backends that filter lazily.
    pub fn to_statement(&self) -> Statement {
        Statement::partial(
            self.subject.cloned(),
            self.predicate.cloned(),
            self.object.cloned(),
        )
    }
}

fn slot_matches(wanted: Option<&Node>, actual: Option<&Node>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual == Some(wanted),
    }
}

/// A statement together with the named graph it was reported in, if any.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Quad {
    pub statement: Statement,
    pub graph: Option<Node>,
}

#[cfg(test)]
mod tests {
    use super::{Axis, Pattern, Statement};
    use crate::core::node::Node;

    fn triple() -> Statement {
        Statement::new(
            Node::uri("http://ex/s"),
            Node::uri("http://ex/p"),
            Node::literal("o"),
        )
    }

    #[test]
    fn take_clears_only_the_axis_slot() {
        let mut statement = triple();
        assert_eq!(statement.take(Axis::Arcs), Some(Node::uri("http://ex/p")));
        assert_eq!(statement.take(Axis::Arcs), None);
        assert_eq!(statement.subject(), Some(&Node::uri("http://ex/s")));
        assert_eq!(statement.object(), Some(&Node::literal("o")));
        assert!(!statement.is_complete());
    }

    #[test]
    fn known_terms_land_around_the_wildcard() {
        let a = Node::uri("http://ex/a");
        let b = Node::uri("http://ex/b");

        let sources = Pattern::with_known(Axis::Sources, &a, &b);
        assert_eq!(
            (sources.subject, sources.predicate, sources.object),
            (None, Some(&a), Some(&b))
        );

        let arcs = Pattern::with_known(Axis::Arcs, &a, &b);
        assert_eq!((arcs.subject, arcs.predicate, arcs.object), (Some(&a), None, Some(&b)));

        let targets = Pattern::with_known(Axis::Targets, &a, &b);
        assert_eq!(
            (targets.subject, targets.predicate, targets.object),
            (Some(&a), Some(&b), None)
        );
        assert_eq!(targets.bound_count(), 2);
    }

    #[test]
    fn pattern_matching_treats_absent_slots_as_wildcards() {
        let statement = triple();
        let s = Node::uri("http://ex/s");
        let other = Node::uri("http://ex/other");

        assert!(Pattern::any().matches(&statement));
        assert!(Pattern { subject: Some(&s), ..Pattern::any() }.matches(&statement));
        assert!(!Pattern { subject: Some(&other), ..Pattern::any() }.matches(&statement));

        let mut emptied = triple();
        emptied.take_subject();
        assert!(!Pattern { subject: Some(&s), ..Pattern::any() }.matches(&emptied));
    }

    #[test]
    fn display_marks_wildcards() {
        let statement = Statement::partial(Some(Node::blank("x")), None, Some(Node::literal("v")));
        assert_eq!(statement.to_string(), "{_:x, ?, \"v\"}");
    }
}
