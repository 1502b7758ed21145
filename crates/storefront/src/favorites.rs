//! Favorites and the shopper's contact.
//!
//! Favorites are keyed by product only, whatever size or color was on
//! screen. The local list is the source of truth; leads sent to the backend
//! are a downstream copy that may fail or repeat without affecting it.

use serde::{Deserialize, Serialize};
use tienda_core::{ContactError, Email, Phone, Price, Product, ProductId};

use crate::leads::{Lead, LeadQueue};
use crate::storage::{ClientStorage, FAVORITES_KEY, StateStore};

/// A favorited product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FavoriteItem {
    pub id: ProductId,
    pub title: String,
    pub image: Option<String>,
    /// Effective price when the product was favorited.
    pub price: Price,
    pub category: String,
}

impl FavoriteItem {
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            image: product.image_url.clone(),
            price: product.effective_price(),
            category: product.category.clone(),
        }
    }
}

/// How the shopper can be reached. At least one channel is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContact {
    pub email: Option<Email>,
    pub phone: Option<Phone>,
}

impl UserContact {
    /// Build a contact from the channels the shopper filled in.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Empty`] if neither channel is given.
    pub fn new(email: Option<Email>, phone: Option<Phone>) -> Result<Self, ContactError> {
        if email.is_none() && phone.is_none() {
            return Err(ContactError::Empty);
        }
        Ok(Self { email, phone })
    }

    /// Parse a contact from raw form input, ignoring blank fields.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or [`ContactError::Empty`] when
    /// both fields are blank.
    pub fn parse(email: Option<&str>, phone: Option<&str>) -> Result<Self, ContactError> {
        let email = email
            .filter(|s| !s.trim().is_empty())
            .map(Email::parse)
            .transpose()?;
        let phone = phone
            .filter(|s| !s.trim().is_empty())
            .map(Phone::parse)
            .transpose()?;
        Self::new(email, phone)
    }

    fn lead_for(&self, item: &FavoriteItem) -> Lead {
        Lead {
            product_id: item.id.clone(),
            title: item.title.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// What a toggle did, for the "saved"/"removed" notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteToggle {
    Saved,
    Removed,
}

/// The stored favorites snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritesSnapshot {
    pub items: Vec<FavoriteItem>,
    pub contact: Option<UserContact>,
}

/// Owns the favorites list and contact, persists them, and feeds leads.
#[derive(Debug)]
pub struct FavoritesManager<S> {
    state: FavoritesSnapshot,
    store: StateStore<S>,
    leads: LeadQueue,
}

impl<S: ClientStorage> FavoritesManager<S> {
    /// Load favorites from `store`, sending any leads to `leads`.
    pub fn load(store: StateStore<S>, leads: LeadQueue) -> Self {
        let mut state = store.load::<FavoritesSnapshot>(FAVORITES_KEY);
        let mut seen = std::collections::HashSet::new();
        state.items.retain(|item| seen.insert(item.id.clone()));
        Self {
            state,
            store,
            leads,
        }
    }

    /// Add `item` if its product is not a favorite yet, otherwise remove it.
    ///
    /// A newly saved favorite is sent as a lead when a contact is known; the
    /// local change is persisted first and stands regardless of delivery.
    pub fn toggle(&mut self, item: FavoriteItem) -> FavoriteToggle {
        if let Some(pos) = self.state.items.iter().position(|f| f.id == item.id) {
            self.state.items.remove(pos);
            self.persist();
            tracing::debug!(product_id = %item.id, "Favorite removed");
            return FavoriteToggle::Removed;
        }

        let lead = self.state.contact.as_ref().map(|c| c.lead_for(&item));
        tracing::debug!(product_id = %item.id, "Favorite saved");
        self.state.items.push(item);
        self.persist();

        if let Some(lead) = lead {
            self.leads.enqueue(lead);
        }
        FavoriteToggle::Saved
    }

    /// Whether `id` is a favorite.
    #[must_use]
    pub fn is_favorite(&self, id: &ProductId) -> bool {
        self.state.items.iter().any(|f| &f.id == id)
    }

    /// Replace the stored contact and send one lead per current favorite.
    ///
    /// Saving the same contact again sends the leads again.
    pub fn save_user_contact(&mut self, contact: UserContact) {
        self.state.contact = Some(contact);
        self.persist();

        if let Some(contact) = &self.state.contact {
            tracing::info!(
                favorites = self.state.items.len(),
                "Contact saved, submitting favorites as leads"
            );
            for item in &self.state.items {
                self.leads.enqueue(contact.lead_for(item));
            }
        }
    }

    #[must_use]
    pub fn items(&self) -> &[FavoriteItem] {
        &self.state.items
    }

    #[must_use]
    pub const fn contact(&self) -> Option<&UserContact> {
        self.state.contact.as_ref()
    }

    #[must_use]
    pub const fn snapshot(&self) -> &FavoritesSnapshot {
        &self.state
    }

    /// Give back the store, e.g. to flush a session-backed storage.
    pub fn into_store(self) -> StateStore<S> {
        self.store
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(FAVORITES_KEY, &self.state) {
            tracing::error!(error = %e, "Failed to persist favorites");
        }
    }
}
