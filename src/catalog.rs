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

//! The reward catalog.
//!
//! Owns reward definitions and their validation and query logic. The
//! catalog has no side effects on point balances; the ledger only reads it
//! to take a price snapshot at purchase time, so deleting or editing a
//! reward never touches existing purchases.
//!
//! # Thread Safety
//!
//! Rewards live in a [`DashMap`], so catalog management and ledger reads
//! proceed concurrently. Updates are serialized per reward by the map
//! entry; managers editing the same reward can additionally pass
//! [`RewardPatch::expected_version`] to detect lost updates.

use crate::base::RewardId;
use crate::error::LedgerError;
use crate::reward::{Reward, RewardDraft, RewardPatch};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrent store of reward definitions.
pub struct RewardCatalog {
    rewards: DashMap<RewardId, Reward>,
    next_id: AtomicU64,
}

impl RewardCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            rewards: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Validates the draft and inserts a new reward.
    ///
    /// # Errors
    ///
    /// [`LedgerError::EmptyName`], [`LedgerError::NegativePrice`] or
    /// [`LedgerError::NegativeStock`] on malformed input; nothing is
    /// inserted in that case.
    pub fn create(&self, draft: RewardDraft) -> Result<Reward, LedgerError> {
        let id = RewardId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let reward = Reward::from_draft(id, draft)?;
        self.rewards.insert(id, reward.clone());
        Ok(reward)
    }

    /// Applies a partial update to an existing reward.
    ///
    /// The precondition check and the write happen under the map entry, so
    /// two concurrent updates to the same reward are serialized. When
    /// `patch.expected_version` is set, a mismatch fails with
    /// [`LedgerError::VersionConflict`] and applies nothing.
    pub fn update(&self, id: RewardId, patch: RewardPatch) -> Result<Reward, LedgerError> {
        let mut entry = self
            .rewards
            .get_mut(&id)
            .ok_or(LedgerError::RewardNotFound(id))?;

        if let Some(expected) = patch.expected_version {
            if entry.version != expected {
                return Err(LedgerError::VersionConflict {
                    expected,
                    found: entry.version,
                });
            }
        }

        entry.apply_patch(patch)?;
        Ok(entry.value().clone())
    }

    /// Removes a reward, returning the removed definition.
    ///
    /// Purchases snapshot the reward name and price at creation, so
    /// historical records stay valid after the reward is gone.
    pub fn delete(&self, id: RewardId) -> Result<Reward, LedgerError> {
        self.rewards
            .remove(&id)
            .map(|(_, reward)| reward)
            .ok_or(LedgerError::RewardNotFound(id))
    }

    /// Retrieves a reward by id.
    pub fn get(&self, id: RewardId) -> Option<Reward> {
        self.rewards.get(&id).map(|r| r.value().clone())
    }

    /// All rewards, ordered by id.
    pub fn list(&self) -> Vec<Reward> {
        self.collect(|_| true)
    }

    /// Rewards currently flagged available (regardless of stock).
    pub fn find_available(&self) -> Vec<Reward> {
        self.collect(|r| r.available)
    }

    /// Rewards priced within the user's points, cheap-first.
    pub fn find_affordable(&self, points: i64) -> Vec<Reward> {
        let mut rewards = self.collect(|r| r.price <= points);
        rewards.sort_by_key(|r| r.price);
        rewards
    }

    /// Rewards with `min <= price <= max`, ordered by id.
    pub fn find_by_price_range(&self, min: i64, max: i64) -> Vec<Reward> {
        self.collect(|r| r.price >= min && r.price <= max)
    }

    /// Rewards whose name contains `query`, case-insensitively.
    pub fn find_by_name(&self, query: &str) -> Vec<Reward> {
        let query = query.to_lowercase();
        self.collect(|r| r.name.to_lowercase().contains(&query))
    }

    /// Number of rewards in the catalog.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    fn collect(&self, filter: impl Fn(&Reward) -> bool) -> Vec<Reward> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|r| filter(r.value()))
            .map(|r| r.value().clone())
            .collect();
        rewards.sort_by_key(|r| r.id);
        rewards
    }
}

impl Default for RewardCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, price: i64) -> RewardDraft {
        RewardDraft {
            name: name.to_string(),
            description: None,
            price,
            available: true,
            stock: None,
        }
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let catalog = RewardCatalog::new();
        let a = catalog.create(draft("A", 10)).unwrap();
        let b = catalog.create(draft("B", 20)).unwrap();
        assert!(a.id < b.id);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn create_rejects_invalid_draft_without_inserting() {
        let catalog = RewardCatalog::new();
        let result = catalog.create(draft("", 10));
        assert_eq!(result, Err(LedgerError::EmptyName));
        assert!(catalog.is_empty());
    }

    #[test]
    fn update_unknown_reward_fails() {
        let catalog = RewardCatalog::new();
        let result = catalog.update(RewardId(99), RewardPatch::default());
        assert_eq!(result, Err(LedgerError::RewardNotFound(RewardId(99))));
    }

    #[test]
    fn update_with_matching_version_applies() {
        let catalog = RewardCatalog::new();
        let r = catalog.create(draft("Mug", 100)).unwrap();

        let updated = catalog
            .update(
                r.id,
                RewardPatch {
                    price: Some(50),
                    expected_version: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.price, 50);
        assert_eq!(updated.version, 1);
    }

    #[test]
    fn update_with_stale_version_conflicts() {
        let catalog = RewardCatalog::new();
        let r = catalog.create(draft("Mug", 100)).unwrap();

        // First editor wins.
        catalog
            .update(
                r.id,
                RewardPatch {
                    price: Some(50),
                    expected_version: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();

        // Second editor still holds version 0.
        let result = catalog.update(
            r.id,
            RewardPatch {
                price: Some(75),
                expected_version: Some(0),
                ..Default::default()
            },
        );
        assert_eq!(
            result,
            Err(LedgerError::VersionConflict {
                expected: 0,
                found: 1
            })
        );
        // The losing write changed nothing.
        assert_eq!(catalog.get(r.id).unwrap().price, 50);
    }

    #[test]
    fn delete_removes_reward() {
        let catalog = RewardCatalog::new();
        let r = catalog.create(draft("Mug", 100)).unwrap();
        let removed = catalog.delete(r.id).unwrap();
        assert_eq!(removed.name, "Mug");
        assert_eq!(catalog.get(r.id), None);
        assert_eq!(
            catalog.delete(r.id),
            Err(LedgerError::RewardNotFound(r.id))
        );
    }

    #[test]
    fn find_available_filters_unavailable() {
        let catalog = RewardCatalog::new();
        catalog.create(draft("A", 10)).unwrap();
        let b = catalog.create(draft("B", 20)).unwrap();
        catalog
            .update(
                b.id,
                RewardPatch {
                    available: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let available = catalog.find_available();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].name, "A");
    }

    #[test]
    fn find_affordable_sorts_cheap_first() {
        let catalog = RewardCatalog::new();
        catalog.create(draft("Pricey", 300)).unwrap();
        catalog.create(draft("Cheap", 10)).unwrap();
        catalog.create(draft("Mid", 100)).unwrap();

        let affordable = catalog.find_affordable(150);
        let names: Vec<_> = affordable.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Cheap", "Mid"]);
    }

    #[test]
    fn find_by_price_range_is_inclusive() {
        let catalog = RewardCatalog::new();
        catalog.create(draft("A", 10)).unwrap();
        catalog.create(draft("B", 50)).unwrap();
        catalog.create(draft("C", 100)).unwrap();

        let found = catalog.find_by_price_range(10, 50);
        let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let catalog = RewardCatalog::new();
        catalog.create(draft("Coffee Voucher", 50)).unwrap();
        catalog.create(draft("Lab Mug", 80)).unwrap();

        let found = catalog.find_by_name("coffee");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Coffee Voucher");
        assert!(catalog.find_by_name("VOUCHER").len() == 1);
        assert!(catalog.find_by_name("tshirt").is_empty());
    }

    #[test]
    fn list_is_ordered_by_id() {
        let catalog = RewardCatalog::new();
        for i in 0..5 {
            catalog.create(draft(&format!("R{i}"), i * 10)).unwrap();
        }
        let list = catalog.list();
        assert_eq!(list.len(), 5);
        assert!(list.windows(2).all(|w| w[0].id < w[1].id));
    }
}
