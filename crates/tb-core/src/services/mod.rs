//! # Services
//!
//! The four capabilities layered over one shared [`ForumRepo`](crate::traits::ForumRepo):
//! identity checks, the post lifecycle, interaction aggregation and the
//! derived rankings.

pub mod identity;
pub mod interactions;
pub mod ranking;
pub mod registry;

pub use identity::IdentityStore;
pub use interactions::InteractionEngine;
pub use ranking::RankingService;
pub use registry::PostRegistry;

use crate::error::{AppError, Result};

/// Rejects blank required fields, returning the trimmed value.
pub(crate) fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{field} cannot be blank")));
    }
    Ok(trimmed)
}
