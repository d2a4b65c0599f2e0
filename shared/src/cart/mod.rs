//! Cart wire model
//!
//! Mirrors what the external cart store hands back: lines with merchandise,
//! cost and line attributes, cart-level attributes, and applied discount codes.
//! Attribute lists are parsed into typed structs at the serde boundary so the
//! engine never looks attributes up by string key.

pub mod attributes;
pub mod line;
pub mod money;
pub mod mutation;
pub mod snapshot;

pub use attributes::*;
pub use line::*;
pub use money::*;
pub use mutation::*;
pub use snapshot::*;
