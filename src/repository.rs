use log::info;

use crate::models::listing::{seed_listings, Listing, ListingDraft};
use crate::storage::SafeStorage;

/// Storage key holding the whole listing collection as one JSON array.
pub const STORAGE_KEY: &str = "imoveis";

/// Owns one in-memory copy of the listing collection.
///
/// Every mutation rewrites the whole collection. There is no coordination
/// between concurrent writers: the last save wins.
pub struct ListingRepository {
    storage: SafeStorage,
    listings: Vec<Listing>,
}

impl ListingRepository {
    pub fn load(storage: SafeStorage) -> Self {
        let listings = storage.get(STORAGE_KEY, Vec::new());
        ListingRepository { storage, listings }
    }

    pub fn get_all(&self) -> &[Listing] {
        &self.listings
    }

    pub fn get_by_id(&self, id: i64) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    /// Replace the collection and persist it.
    pub fn save(&mut self, listings: Vec<Listing>) {
        self.listings = listings;
        self.flush();
    }

    pub fn flush(&self) {
        self.storage.set(STORAGE_KEY, &self.listings);
    }

    /// Install the sample listings when the collection is empty.
    /// Returns true if it seeded.
    pub fn seed_if_empty(&mut self) -> bool {
        if !self.listings.is_empty() {
            return false;
        }
        info!("Listing collection empty, installing sample listings");
        self.save(seed_listings());
        true
    }

    /// The `n` most recently added, newest first.
    pub fn featured(&self, n: usize) -> Vec<Listing> {
        self.listings.iter().rev().take(n).cloned().collect()
    }

    /// Millisecond timestamp, bumped past the current maximum on collision.
    fn next_id(&self) -> i64 {
        let candidate = chrono::Utc::now().timestamp_millis();
        if self.get_by_id(candidate).is_none() {
            return candidate;
        }
        self.listings.iter().map(|l| l.id).max().unwrap_or(0) + 1
    }

    pub fn create(&mut self, draft: ListingDraft) -> i64 {
        let id = self.next_id();
        self.listings.push(draft.into_listing(id));
        self.flush();
        id
    }

    pub fn update(&mut self, id: i64, draft: ListingDraft) -> Result<(), String> {
        let listing = self
            .listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| format!("listing {} not found", id))?;
        listing.merge(draft);
        self.flush();
        Ok(())
    }

    /// Remove the listing with `id`. Returns true if one was removed.
    pub fn delete(&mut self, id: i64) -> bool {
        let before = self.listings.len();
        self.listings.retain(|l| l.id != id);
        if self.listings.len() == before {
            return false;
        }
        self.flush();
        true
    }
}
