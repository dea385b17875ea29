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

//! Purchase records and the purchase state machine.
//!
//! Purchases follow a state machine:
//! - [`Pending`] → [`Approved`] (via approve) or [`Rejected`] (via reject)
//!   or [`Cancelled`] (via cancel)
//! - [`Approved`] → [`Completed`] (via complete) or [`Cancelled`] (via cancel)
//!
//! Rejecting or cancelling refunds the purchase price; the terminal states
//! admit no further transition, so a refund can happen at most once.
//!
//! [`Pending`]: PurchaseStatus::Pending
//! [`Approved`]: PurchaseStatus::Approved
//! [`Rejected`]: PurchaseStatus::Rejected
//! [`Completed`]: PurchaseStatus::Completed
//! [`Cancelled`]: PurchaseStatus::Cancelled

use crate::base::{PurchaseId, RewardId, UserId};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a purchase request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl PurchaseStatus {
    /// Returns true for statuses that admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Operation requested against an existing purchase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseAction {
    Approve,
    Reject,
    Complete,
    Cancel,
}

impl fmt::Display for PurchaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// Balance effect a transition carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointEffect {
    /// Balance untouched.
    None,
    /// Credit the purchase price back to the purchaser.
    Refund,
}

/// Outcome of a legal transition: the new status and its balance effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: PurchaseStatus,
    pub effect: PointEffect,
}

/// Resolves a requested action against the current status.
///
/// This is the authoritative transition table. The match is exhaustive over
/// every (status, action) pair; the six legal transitions return the new
/// status and its point effect, everything else is an
/// [`LedgerError::InvalidTransition`].
pub fn next_status(
    from: PurchaseStatus,
    action: PurchaseAction,
) -> Result<Transition, LedgerError> {
    use PurchaseAction::*;
    use PurchaseStatus::*;

    let transition = match (from, action) {
        (Pending, Approve) => Transition {
            to: Approved,
            effect: PointEffect::None,
        },
        (Pending, Reject) => Transition {
            to: Rejected,
            effect: PointEffect::Refund,
        },
        (Pending, Cancel) => Transition {
            to: Cancelled,
            effect: PointEffect::Refund,
        },
        (Approved, Complete) => Transition {
            to: Completed,
            effect: PointEffect::None,
        },
        (Approved, Cancel) => Transition {
            to: Cancelled,
            effect: PointEffect::Refund,
        },
        (Pending, Complete)
        | (Approved, Approve)
        | (Approved, Reject)
        | (Rejected, _)
        | (Completed, _)
        | (Cancelled, _) => return Err(LedgerError::InvalidTransition { from, action }),
    };

    Ok(transition)
}

/// A user's request to redeem a reward.
///
/// `reward_name` and `price` are snapshots taken when the purchase is
/// created; later edits (or deletion) of the reward never change them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub reward_id: RewardId,
    pub reward_name: String,
    pub price: i64,
    pub purchase_date: DateTime<Utc>,
    pub status: PurchaseStatus,
}
