//! Cart and wishlist mappings owned by a user record.
//!
//! Both types serialize transparently to the nested JSON documents stored in
//! `users.cart_data` / `users.wishlist_data` and mirrored by the storefront
//! UI. `BTreeMap` keeps serialization order deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Nested cart mapping: product id → size label → quantity.
///
/// Absent entries imply zero. Setting a quantity of zero (or removing the
/// last size of a product) deletes the entry rather than persisting a zero
/// line, so the read path never reports empty lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartData(BTreeMap<String, BTreeMap<String, u32>>);

impl CartData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the quantity at (product, size) by one, creating
    /// intermediate map levels as needed.
    pub fn add(&mut self, product_id: &str, size: &str) {
        let line = self
            .0
            .entry(product_id.to_owned())
            .or_default()
            .entry(size.to_owned())
            .or_insert(0);
        *line = line.saturating_add(1);
    }

    /// Sets an explicit quantity for an existing line. Zero removes the
    /// line and prunes the product entry once its size map is empty.
    pub fn set_quantity(&mut self, product_id: &str, size: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_line(product_id, size);
            return;
        }
        if let Some(sizes) = self.0.get_mut(product_id) {
            if let Some(line) = sizes.get_mut(size) {
                *line = quantity;
            }
        }
    }

    /// Removes a (product, size) line, pruning the product entry when empty.
    pub fn remove_line(&mut self, product_id: &str, size: &str) {
        if let Some(sizes) = self.0.get_mut(product_id) {
            sizes.remove(size);
            if sizes.is_empty() {
                self.0.remove(product_id);
            }
        }
    }

    #[must_use]
    pub fn quantity(&self, product_id: &str, size: &str) -> u32 {
        self.0
            .get(product_id)
            .and_then(|sizes| sizes.get(size))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn contains_line(&self, product_id: &str, size: &str) -> bool {
        self.0
            .get(product_id)
            .is_some_and(|sizes| sizes.contains_key(size))
    }

    /// Total units across all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.0
            .values()
            .flat_map(BTreeMap::values)
            .map(|q| u64::from(*q))
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates (product id, size, quantity) lines in key order.
    pub fn lines(&self) -> impl Iterator<Item = (&str, &str, u32)> {
        self.0.iter().flat_map(|(product_id, sizes)| {
            sizes
                .iter()
                .map(move |(size, qty)| (product_id.as_str(), size.as_str(), *qty))
        })
    }
}

/// Wishlist mapping: product id → presence flag.
///
/// Removal deletes the key; the map never stores `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WishlistData(BTreeMap<String, bool>);

impl WishlistData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product_id: &str) {
        self.0.insert(product_id.to_owned(), true);
    }

    pub fn remove(&mut self, product_id: &str) {
        self.0.remove(product_id);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.0.contains_key(product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
