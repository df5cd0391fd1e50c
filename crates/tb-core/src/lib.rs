//! topic-board/crates/tb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Topic-Board:
//! post lifecycle, interaction aggregation and the ranking views.

pub mod clock;
pub mod error;
pub mod models;
pub mod services;
pub mod time;
pub mod traits;

// Re-exporting for easier access in other crates
pub use clock::*;
pub use error::*;
pub use models::*;
pub use services::{IdentityStore, InteractionEngine, PostRegistry, RankingService};
pub use traits::*;
