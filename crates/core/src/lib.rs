//! ItemKeeper domain model.
//!
//! - [`record`]: item records, recycle-bin entries and their JSON shape.
//! - [`collection`]: pure operations over the active collection and the
//!   recycle bin (create, tag, search, move-to-bin, restore, purge, sweep).
//! - [`intent`]: the structured output contract of the external intent
//!   classifier.
//! - [`error`]: the domain error type shared by every crate.

pub mod collection;
pub mod error;
pub mod intent;
pub mod record;
pub mod types;
