// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Reward definitions and purchasability rules.
//!
//! A [`Reward`] is a catalog item purchasable with points. Whether a given
//! user may purchase it is decided by exactly one predicate,
//! [`Reward::purchasability`], which reports the blocking reason with a
//! fixed priority: unavailable > out of stock > insufficient points.

use crate::base::RewardId;
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog item purchasable with points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reward {
    pub id: RewardId,
    pub name: String,
    pub description: Option<String>,
    /// Price in points, never negative.
    pub price: i64,
    pub available: bool,
    /// Remaining stock; `None` means unlimited.
    pub stock: Option<i64>,
    /// Bumped on every update; lets concurrent editors detect lost writes.
    pub version: u64,
}

/// Validated input for creating a reward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub available: bool,
    pub stock: Option<i64>,
}

impl RewardDraft {
    /// Trims the name and checks the field invariants.
    pub(crate) fn validate(mut self) -> Result<Self, LedgerError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        if self.price < 0 {
            return Err(LedgerError::NegativePrice);
        }
        if matches!(self.stock, Some(s) if s < 0) {
            return Err(LedgerError::NegativeStock);
        }
        Ok(self)
    }
}

/// Partial update for an existing reward. `None` fields are left unchanged.
///
/// `description` and `stock` are doubly optional: the outer `Option` is
/// "change it or not", the inner value is the new state (including clearing
/// it with `Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<i64>,
    pub available: Option<bool>,
    pub stock: Option<Option<i64>>,
    /// When set, the update only applies if the stored version matches;
    /// otherwise it fails with [`LedgerError::VersionConflict`].
    pub expected_version: Option<u64>,
}

/// Why a purchase is (or is not) possible, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purchasability {
    Unavailable,
    OutOfStock,
    InsufficientPoints,
    Purchasable,
}

impl Purchasability {
    /// Human-readable validation message for the presentation layer.
    pub fn message(self) -> &'static str {
        match self {
            Self::Unavailable => "This reward is currently not available",
            Self::OutOfStock => "This reward is out of stock",
            Self::InsufficientPoints => "You do not have enough points for this reward",
            Self::Purchasable => "This reward can be purchased",
        }
    }
}

impl fmt::Display for Purchasability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Reward {
    /// Builds a validated reward. Used by the catalog, which assigns the id.
    pub(crate) fn from_draft(id: RewardId, draft: RewardDraft) -> Result<Self, LedgerError> {
        let draft = draft.validate()?;
        Ok(Self {
            id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            available: draft.available,
            stock: draft.stock,
            version: 0,
        })
    }

    /// True when the reward has stock left (or no stock counter at all).
    pub fn in_stock(&self) -> bool {
        match self.stock {
            None => true,
            Some(s) => s > 0,
        }
    }

    /// The single authority consulted before a purchase is created.
    ///
    /// The ledger re-evaluates this inside the same critical section as the
    /// debit, so a stale catalog read cannot slip a purchase through.
    pub fn can_be_purchased(&self, user_points: i64) -> bool {
        self.available && self.in_stock() && user_points >= self.price
    }

    /// The blocking reason, checked in fixed priority order.
    pub fn purchasability(&self, user_points: i64) -> Purchasability {
        if !self.available {
            Purchasability::Unavailable
        } else if !self.in_stock() {
            Purchasability::OutOfStock
        } else if user_points < self.price {
            Purchasability::InsufficientPoints
        } else {
            Purchasability::Purchasable
        }
    }

    /// Deterministic, prioritized human-readable purchase validation message.
    pub fn purchase_validation_message(&self, user_points: i64) -> &'static str {
        self.purchasability(user_points).message()
    }

    /// Applies a patch, bumping the version. The caller (the catalog) has
    /// already checked `expected_version`.
    pub(crate) fn apply_patch(&mut self, patch: RewardPatch) -> Result<(), LedgerError> {
        if let Some(name) = &patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(LedgerError::EmptyName);
            }
        }
        if matches!(patch.price, Some(p) if p < 0) {
            return Err(LedgerError::NegativePrice);
        }
        if matches!(patch.stock, Some(Some(s)) if s < 0) {
            return Err(LedgerError::NegativeStock);
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(available) = patch.available {
            self.available = available;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        self.version += 1;
        Ok(())
    }
}
