//! Status publication: directory tree and human-readable text.

mod publish;
mod tree;

pub use publish::StatusPublisher;
pub use tree::StatusTree;
