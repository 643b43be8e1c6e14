use tracing::{info, warn};

use crate::contact::ContactStore;
use crate::error::AppError;
use crate::location::Location;
use crate::navigation::{NavigationMode, NavigationTicket, Navigator};

/// Create a blank contact and redirect to its edit form.
///
/// The redirect supersedes whatever navigation is in flight. Nothing is
/// fetched here; the list refreshes when the edit route loads. On failure
/// no navigation is issued.
pub fn create_and_edit_new_contact(
    store: &dyn ContactStore,
    navigator: &mut Navigator,
) -> Result<NavigationTicket, AppError> {
    let contact = store.create_contact().map_err(|err| {
        warn!(error = %format!("{:#}", err), "contact creation failed");
        AppError::store_unavailable(&err)
    })?;
    info!(id = %contact.id, "new contact");
    Ok(navigator.navigate(Location::edit_contact(&contact.id), NavigationMode::Push))
}
