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

//! The purchase ledger.
//!
//! The [`PurchaseLedger`] is the central component of the reward economy.
//! It creates purchases as priced snapshots of catalog rewards, enforces
//! the purchase state machine, and performs the paired point debit/credit
//! each transition requires.
//!
//! # Operations
//!
//! - **Create**: re-validates purchasability, debits the price, and inserts
//!   a `pending` purchase — all under the purchaser's account lock.
//! - **Approve/Complete**: status-only transitions, no point effect.
//! - **Reject/Cancel**: status transition plus a refund credit, applied in
//!   the same critical section as the status write.
//! - **Bulk approve/reject**: per-id application with isolated failures.
//!
//! # Thread Safety
//!
//! Accounts and purchases live in [`DashMap`]s; every operation acquires
//! locks in the fixed order *directory shard → account mutex → purchase
//! entry*, so concurrent requests for different users and purchases
//! proceed in parallel while operations on one purchase serialize. Of two
//! concurrent `approve` calls on the same pending purchase, exactly one
//! commits; the other re-reads the committed status under the lock and
//! fails with [`LedgerError::InvalidTransition`].

use crate::account::UserDirectory;
use crate::base::{PurchaseId, RewardId, UserId};
use crate::catalog::RewardCatalog;
use crate::error::LedgerError;
use crate::purchase::{next_status, PointEffect, Purchase, PurchaseAction, PurchaseStatus};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-id result of a bulk operation.
///
/// A failed id never aborts the remaining ids; callers get the full list
/// of outcomes instead of a single aggregate error.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    pub id: PurchaseId,
    pub result: Result<Purchase, LedgerError>,
}

/// Purchase state machine plus point bookkeeping.
pub struct PurchaseLedger {
    catalog: Arc<RewardCatalog>,
    directory: Arc<UserDirectory>,
    purchases: DashMap<PurchaseId, Purchase>,
    next_id: AtomicU64,
}

impl PurchaseLedger {
    /// Creates a ledger over the given catalog and user directory.
    pub fn new(catalog: Arc<RewardCatalog>, directory: Arc<UserDirectory>) -> Self {
        Self {
            catalog,
            directory,
            purchases: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn catalog(&self) -> &RewardCatalog {
        &self.catalog
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Creates a `pending` purchase, debiting the reward price.
    ///
    /// The reward is re-read and the purchasability predicate re-evaluated
    /// after the account lock is taken, so a catalog edit racing with this
    /// call cannot produce a purchase the predicate would have blocked.
    /// Debit and insert happen under the same lock: a failure leaves no
    /// trace, and no reader can observe the debit without the record.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UserNotFound`] / [`LedgerError::RewardNotFound`]
    /// - [`LedgerError::RewardUnavailable`] / [`LedgerError::OutOfStock`] /
    ///   [`LedgerError::InsufficientPoints`] when the catalog predicate
    ///   blocks the purchase, in that priority order.
    pub fn create(&self, user_id: UserId, reward_id: RewardId) -> Result<Purchase, LedgerError> {
        let account = self
            .directory
            .get(user_id)
            .ok_or(LedgerError::UserNotFound(user_id))?;
        let mut balance = account.lock();

        let reward = self
            .catalog
            .get(reward_id)
            .ok_or(LedgerError::RewardNotFound(reward_id))?;

        use crate::reward::Purchasability::*;
        match reward.purchasability(balance.balance) {
            Unavailable => return Err(LedgerError::RewardUnavailable),
            OutOfStock => return Err(LedgerError::OutOfStock),
            InsufficientPoints => {
                return Err(LedgerError::InsufficientPoints {
                    balance: balance.balance,
                    price: reward.price,
                });
            }
            Purchasable => {}
        }

        balance.debit(reward.price)?;

        let id = PurchaseId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let purchase = Purchase {
            id,
            user_id,
            reward_id,
            reward_name: reward.name,
            price: reward.price,
            purchase_date: Utc::now(),
            status: PurchaseStatus::Pending,
        };
        self.purchases.insert(id, purchase.clone());

        tracing::debug!(
            purchase = %id,
            user = %user_id,
            reward = %reward_id,
            price = purchase.price,
            "purchase created"
        );
        Ok(purchase)
    }

    /// `pending` → `approved`. No point effect.
    pub fn approve(&self, id: PurchaseId) -> Result<Purchase, LedgerError> {
        self.transition(id, PurchaseAction::Approve)
    }

    /// `pending` → `rejected`, refunding the snapshot price.
    pub fn reject(&self, id: PurchaseId) -> Result<Purchase, LedgerError> {
        self.transition(id, PurchaseAction::Reject)
    }

    /// `approved` → `completed`. Points stay spent.
    pub fn complete(&self, id: PurchaseId) -> Result<Purchase, LedgerError> {
        self.transition(id, PurchaseAction::Complete)
    }

    /// `pending`/`approved` → `cancelled`, refunding the snapshot price.
    pub fn cancel(&self, id: PurchaseId) -> Result<Purchase, LedgerError> {
        self.transition(id, PurchaseAction::Cancel)
    }

    /// Approves each id independently; failures are reported per id.
    pub fn bulk_approve(&self, ids: &[PurchaseId]) -> Vec<BulkOutcome> {
        self.bulk(ids, PurchaseAction::Approve)
    }

    /// Rejects each id independently; failures are reported per id.
    pub fn bulk_reject(&self, ids: &[PurchaseId]) -> Vec<BulkOutcome> {
        self.bulk(ids, PurchaseAction::Reject)
    }

    fn bulk(&self, ids: &[PurchaseId], action: PurchaseAction) -> Vec<BulkOutcome> {
        ids.iter()
            .map(|&id| {
                let result = self.transition(id, action);
                if let Err(error) = &result {
                    tracing::warn!(purchase = %id, %action, %error, "bulk item failed");
                }
                BulkOutcome { id, result }
            })
            .collect()
    }

    /// Applies one state-machine action to one purchase.
    ///
    /// The precondition check, the status write, and any refund credit all
    /// happen while holding the account mutex and the purchase entry, so
    /// the transition is all-or-nothing and serialized per purchase.
    fn transition(
        &self,
        id: PurchaseId,
        action: PurchaseAction,
    ) -> Result<Purchase, LedgerError> {
        // Owner lookup only; the status read below this lock is the
        // authoritative one.
        let user_id = self
            .purchases
            .get(&id)
            .ok_or(LedgerError::PurchaseNotFound(id))?
            .user_id;

        let account = self
            .directory
            .get(user_id)
            .ok_or(LedgerError::UserNotFound(user_id))?;
        let mut balance = account.lock();

        let mut entry = self
            .purchases
            .get_mut(&id)
            .ok_or(LedgerError::PurchaseNotFound(id))?;
        let transition = next_status(entry.status, action)?;

        entry.status = transition.to;
        if transition.effect == PointEffect::Refund {
            balance.credit(entry.price);
        }

        tracing::debug!(
            purchase = %id,
            user = %user_id,
            %action,
            status = %entry.status,
            refunded = transition.effect == PointEffect::Refund,
            "purchase transitioned"
        );
        Ok(entry.value().clone())
    }

    /// Retrieves a purchase by id.
    pub fn get(&self, id: PurchaseId) -> Option<Purchase> {
        self.purchases.get(&id).map(|p| p.value().clone())
    }

    /// All purchases in creation order.
    pub fn list(&self) -> Vec<Purchase> {
        self.collect(|_| true)
    }

    /// Purchases made by one user, in creation order.
    pub fn find_by_user(&self, user_id: UserId) -> Vec<Purchase> {
        self.collect(|p| p.user_id == user_id)
    }

    /// Purchases in one status, in creation order.
    pub fn find_by_status(&self, status: PurchaseStatus) -> Vec<Purchase> {
        self.collect(|p| p.status == status)
    }

    /// The approval queue.
    pub fn find_pending(&self) -> Vec<Purchase> {
        self.find_by_status(PurchaseStatus::Pending)
    }

    /// Purchases referencing one reward, in creation order.
    pub fn find_by_reward(&self, reward_id: RewardId) -> Vec<Purchase> {
        self.collect(|p| p.reward_id == reward_id)
    }

    pub fn len(&self) -> usize {
        self.purchases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }

    fn collect(&self, filter: impl Fn(&Purchase) -> bool) -> Vec<Purchase> {
        let mut purchases: Vec<Purchase> = self
            .purchases
            .iter()
            .filter(|p| filter(p.value()))
            .map(|p| p.value().clone())
            .collect();
        purchases.sort_by_key(|p| p.id);
        purchases
    }
}
