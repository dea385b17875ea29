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

//! Error types for catalog and ledger operations.

use crate::base::{PurchaseId, RewardId, UserId};
use crate::purchase::{PurchaseAction, PurchaseStatus};
use thiserror::Error;

/// Reward catalog and purchase ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Reward name is empty after trimming
    #[error("reward name must not be empty")]
    EmptyName,

    /// Reward price is negative
    #[error("reward price must not be negative")]
    NegativePrice,

    /// Reward stock is negative
    #[error("reward stock must not be negative")]
    NegativeStock,

    /// Opening balance for a user is negative
    #[error("points balance must not be negative")]
    NegativeBalance,

    /// Referenced user does not exist
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Referenced reward does not exist
    #[error("reward {0} not found")]
    RewardNotFound(RewardId),

    /// Referenced purchase does not exist
    #[error("purchase {0} not found")]
    PurchaseNotFound(PurchaseId),

    /// Reward is flagged unavailable
    #[error("reward is not available")]
    RewardUnavailable,

    /// Reward has a stock counter and it is exhausted
    #[error("reward is out of stock")]
    OutOfStock,

    /// Purchase would exceed the user's points balance
    #[error("insufficient points: balance {balance}, price {price}")]
    InsufficientPoints { balance: i64, price: i64 },

    /// Requested operation is not a legal transition from the current status
    #[error("cannot {action} a {from} purchase")]
    InvalidTransition {
        from: PurchaseStatus,
        action: PurchaseAction,
    },

    /// A concurrent update invalidated the caller's expected reward version
    #[error("reward version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },
}
