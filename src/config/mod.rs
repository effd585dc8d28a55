//! Configuration: document schema, canonical snapshot, reconciliation engine.
//!
//! - [`schema`]: the TOML document and its defaults;
//! - [`snapshot`]: clamped canonical form, rebuilt from zero on every reload;
//! - [`engine`]: the ordered, partial-failure-tolerant apply sequence.

mod engine;
mod schema;
mod snapshot;

pub use engine::{ApplySummary, ReconfigEngine};
pub use schema::{ConfigDoc, PortSection};
pub use snapshot::{BridgeConfig, ConfigSnapshot, PortConfig, PortMember, MAX_PORTS};
