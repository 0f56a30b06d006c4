// Query execution over a pooled driver connection and result-shape decoding.
pub mod context;
pub mod driver;
pub mod format;
pub mod graph;
pub mod shape;
