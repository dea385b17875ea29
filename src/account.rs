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

//! Points accounts.
//!
//! A [`PointsAccount`] holds a user's spendable balance. The only writers
//! are the debit/credit primitives on [`AccountState`], which are crate
//! private: every balance change in the system goes through the purchase
//! ledger, and code outside this crate cannot assign to a balance at all.

use crate::base::UserId;
use crate::error::LedgerError;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};

/// Mutable balance state, only reachable through the account mutex.
#[derive(Debug)]
pub(crate) struct AccountState {
    pub(crate) balance: i64,
}

impl AccountState {
    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= 0,
            "Invariant violated: points balance went negative: {}",
            self.balance
        );
    }

    /// Removes points from the balance.
    ///
    /// Fails with [`LedgerError::InsufficientPoints`] when the balance is
    /// too small; the balance is untouched in that case.
    pub(crate) fn debit(&mut self, amount: i64) -> Result<(), LedgerError> {
        if self.balance < amount {
            return Err(LedgerError::InsufficientPoints {
                balance: self.balance,
                price: amount,
            });
        }
        self.balance -= amount;
        self.assert_invariants();
        Ok(())
    }

    /// Adds points to the balance. Always succeeds.
    pub(crate) fn credit(&mut self, amount: i64) {
        self.balance += amount;
        self.assert_invariants();
    }
}

/// A user's points balance.
#[derive(Debug)]
pub struct PointsAccount {
    inner: Mutex<AccountState>,
}

impl PointsAccount {
    pub fn new(balance: i64) -> Self {
        Self {
            inner: Mutex::new(AccountState { balance }),
        }
    }

    /// Current balance.
    pub fn balance(&self) -> i64 {
        self.inner.lock().balance
    }

    /// Locks the balance for a compound ledger operation. The guard is held
    /// across the purchasability check, the debit, and the purchase insert
    /// so no intermediate state is observable.
    pub(crate) fn lock(&self) -> MutexGuard<'_, AccountState> {
        self.inner.lock()
    }
}

/// The user records visible to the core: `{id, points}` pairs.
///
/// User creation, roles, and authentication live outside the core; the
/// external directory hands records in through [`register`] and reads
/// balances back out. Balances themselves only move through the ledger.
///
/// [`register`]: UserDirectory::register
pub struct UserDirectory {
    users: DashMap<UserId, PointsAccount>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// Adds a user with an opening balance. Registering an id that already
    /// exists leaves the stored balance untouched.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NegativeBalance`] if `points` is negative.
    pub fn register(&self, id: UserId, points: i64) -> Result<(), LedgerError> {
        if points < 0 {
            return Err(LedgerError::NegativeBalance);
        }
        self.users
            .entry(id)
            .or_insert_with(|| PointsAccount::new(points));
        Ok(())
    }

    /// Current balance for a user.
    pub fn balance(&self, id: UserId) -> Result<i64, LedgerError> {
        self.users
            .get(&id)
            .map(|account| account.balance())
            .ok_or(LedgerError::UserNotFound(id))
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// Iterates over all `(id, account)` pairs, for reporting output.
    pub fn accounts(
        &self,
    ) -> impl Iterator<Item = dashmap::mapref::multiple::RefMulti<'_, UserId, PointsAccount>> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub(crate) fn get(
        &self,
        id: UserId,
    ) -> Option<dashmap::mapref::one::Ref<'_, UserId, PointsAccount>> {
        self.users.get(&id)
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}
