//! Ordered fallback over field locations.

use tracing::debug;

use super::{CertificateView, FieldLocator};

/// Returns the value at the first locator that yields one.
///
/// Locators are tried strictly in order. A location that is empty or holds
/// a malformed value counts as absent and the next locator is tried.
/// Returns `None` once every locator is exhausted.
pub fn resolve<V>(view: &V, locators: &[FieldLocator]) -> Option<String>
where
    V: CertificateView + ?Sized,
{
    locators.iter().find_map(|locator| match view.lookup(locator) {
        Ok(value) => value,
        Err(e) => {
            debug!(%locator, error = %e, "skipping malformed field location");
            None
        },
    })
}
