//! Collection-scoped access services.
//!
//! Each service owns one collection: it sanitizes writes at the boundary, shapes the
//! queries page controllers need, and returns an [`AccessResult`] so callers can tell a
//! rejected write, a missing document, and a backend failure apart.

pub mod analytics;
pub mod candidates;
pub mod error;
pub mod feedback;
mod input;
pub mod promises;
pub mod reports;
pub mod schema;
pub mod users;

pub use analytics::{AnalyticsService, PageViews};
pub use candidates::{Candidate, CandidateService, Disclosure};
pub use error::{AccessError, AccessResult, ValidationError, WriteOutcome};
pub use feedback::{Feedback, FeedbackService};
pub use promises::{ElectionPromise, PromiseService, PromiseStatus};
pub use reports::{Report, ReportKind, ReportService};
pub use users::{Role, UserProfile, UserService};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::store::{Collection, Document};

/// Decode a query result, skipping documents whose stored shape no longer matches the
/// record type.
pub(crate) fn decode_all<T: DeserializeOwned>(
    collection: Collection,
    documents: Vec<Document>,
) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|document| match document.decode::<T>() {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(%collection, error = %err, "skipping undecodable document");
                None
            }
        })
        .collect()
}

/// Treat an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
