pub mod metadata;
pub mod recognize;

pub use metadata::{health, image_types, languages, revisions};
pub use recognize::{recognize, recognize_batch};

use crate::api::AppState;
use crate::error::{OcrdError, Result};
use crate::models::Revision;

/// Reject revisions the engine does not know; `None` is always fine.
pub(crate) fn ensure_revision(state: &AppState, revision: Option<&Revision>) -> Result<()> {
    match revision {
        Some(revision) if !state.engine().supports_revision(revision) => Err(
            OcrdError::Validation(format!("Invalid Revision: {revision}")),
        ),
        _ => Ok(()),
    }
}
