// Core modules implementing triple storage, streams, projection, and error modeling.
pub mod backend;
pub mod error;
pub mod node;
pub mod options;
pub mod projection;
pub mod registry;
pub mod statement;
pub mod storage;
pub mod stream;
