//! Promotion configuration models
//!
//! Milestones and variants drive threshold perks, bundle rules drive bundle
//! completeness, catalog types describe what the catalog collaborator returns.
//! All of them are static configuration or collaborator data; nothing here is
//! derived per cart.

pub mod bundle;
pub mod catalog;
pub mod milestone;

pub use bundle::*;
pub use catalog::*;
pub use milestone::*;
