use std::sync::Arc;

use crate::repository::ListingRepository;
use crate::storage::SafeStorage;
use crate::store::Store;

pub mod admin;
pub mod admin_api;
pub mod auth;
pub mod public;

/// Fresh repository over the managed store.
pub(crate) fn load_listings(store: &Arc<dyn Store>) -> ListingRepository {
    ListingRepository::load(SafeStorage::new(Arc::clone(store)))
}
