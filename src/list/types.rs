use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Shoppers;

// ============================================================================
// Shopper
// ============================================================================

/// One of the two people sharing the list.
///
/// Stored on the wire as `"UserA"` / `"UserB"`; the names shown in the UI come
/// from the `[shoppers]` config table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shopper {
    UserA,
    UserB,
}

impl Shopper {
    /// The other shopper (form toggle).
    pub fn other(self) -> Self {
        match self {
            Shopper::UserA => Shopper::UserB,
            Shopper::UserB => Shopper::UserA,
        }
    }

    pub fn display_name(self, shoppers: &Shoppers) -> &str {
        match self {
            Shopper::UserA => &shoppers.user_a,
            Shopper::UserB => &shoppers.user_b,
        }
    }
}

impl fmt::Display for Shopper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shopper::UserA => f.write_str("UserA"),
            Shopper::UserB => f.write_str("UserB"),
        }
    }
}

// ============================================================================
// Items
// ============================================================================

fn is_false(b: &bool) -> bool {
    !*b
}

/// A single entry on the list. `name` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub name: String,
    pub ordered_by: Shopper,
    pub ordered_on: DateTime<Utc>,
    /// Soft-delete flag used by the keyed store; always false in the document store.
    #[serde(default, skip_serializing_if = "is_false")]
    pub obtained: bool,
}

impl ShoppingItem {
    pub fn new(name: impl Into<String>, ordered_by: Shopper, ordered_on: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            ordered_by,
            ordered_on,
            obtained: false,
        }
    }
}

/// Value side of the keyed store's `name -> entry` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedEntry {
    pub ordered_by: Shopper,
    pub ordered_on: DateTime<Utc>,
    #[serde(default)]
    pub obtained: bool,
}

impl From<&ShoppingItem> for KeyedEntry {
    fn from(item: &ShoppingItem) -> Self {
        Self {
            ordered_by: item.ordered_by,
            ordered_on: item.ordered_on,
            obtained: item.obtained,
        }
    }
}

/// A change to the list, computed locally and sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Add(ShoppingItem),
    Remove(String),
}

impl Mutation {
    pub fn name(&self) -> &str {
        match self {
            Mutation::Add(item) => &item.name,
            Mutation::Remove(name) => name,
        }
    }
}

// ============================================================================
// ShoppingList
// ============================================================================

/// The confirmed list, newest first.
///
/// Only ever holds data the store acknowledged. Active names are unique;
/// obtained entries (keyed store only) are kept so a removal can be undone
/// by adding the same name again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
}

impl ShoppingList {
    pub fn new(items: Vec<ShoppingItem>) -> Self {
        Self { items }
    }

    /// Every entry, including obtained ones.
    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ShoppingItem> {
        self.items
    }

    /// Entries still to buy.
    pub fn active(&self) -> impl Iterator<Item = &ShoppingItem> {
        self.items.iter().filter(|item| !item.obtained)
    }

    pub fn active_len(&self) -> usize {
        self.active().count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_len() == 0
    }

    /// The active entry with this exact name.
    pub fn get_active(&self, name: &str) -> Option<&ShoppingItem> {
        self.active().find(|item| item.name == name)
    }

    pub fn contains_active(&self, name: &str) -> bool {
        self.get_active(name).is_some()
    }

    /// The list that results from applying `mutation` to this one.
    ///
    /// Add prepends, replacing any entry of the same name. Remove drops every
    /// entry of that name; removing an absent name returns an equal list.
    pub fn apply(&self, mutation: &Mutation) -> ShoppingList {
        match mutation {
            Mutation::Add(item) => {
                let mut items = Vec::with_capacity(self.items.len() + 1);
                items.push(item.clone());
                items.extend(
                    self.items
                        .iter()
                        .filter(|existing| existing.name != item.name)
                        .cloned(),
                );
                ShoppingList { items }
            }
            Mutation::Remove(name) => ShoppingList {
                items: self
                    .items
                    .iter()
                    .filter(|existing| &existing.name != name)
                    .cloned()
                    .collect(),
            },
        }
    }

    /// Build a list from the keyed store's mapping: newest first, ties by name.
    pub fn from_keyed(entries: BTreeMap<String, KeyedEntry>) -> Self {
        let mut items: Vec<ShoppingItem> = entries
            .into_iter()
            .map(|(name, entry)| ShoppingItem {
                name,
                ordered_by: entry.ordered_by,
                ordered_on: entry.ordered_on,
                obtained: entry.obtained,
            })
            .collect();
        items.sort_by(|a, b| {
            b.ordered_on
                .cmp(&a.ordered_on)
                .then_with(|| a.name.cmp(&b.name))
        });
        Self { items }
    }
}
