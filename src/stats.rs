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

//! Read-only aggregation over purchase and reward history.
//!
//! Everything here is a pure function over slices: callers pick the
//! purchases they care about (all of them, one status, one user) and get
//! aggregate numbers back. Nothing in this module mutates ledger state.
//!
//! Averages are [`Decimal`] because point prices are integral but their
//! mean rarely is.

use crate::base::{RewardId, UserId};
use crate::purchase::{Purchase, PurchaseStatus};
use crate::reward::Reward;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Purchase counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn tally(purchases: &[Purchase]) -> Self {
        let mut counts = Self::default();
        for purchase in purchases {
            match purchase.status {
                PurchaseStatus::Pending => counts.pending += 1,
                PurchaseStatus::Approved => counts.approved += 1,
                PurchaseStatus::Rejected => counts.rejected += 1,
                PurchaseStatus::Completed => counts.completed += 1,
                PurchaseStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.completed + self.cancelled
    }
}

/// Count, point sum, and average price over a purchase selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseStats {
    pub count: usize,
    pub total_points: i64,
    /// `None` when the selection is empty.
    pub average_price: Option<Decimal>,
}

impl PurchaseStats {
    pub fn compute(purchases: &[Purchase]) -> Self {
        let count = purchases.len();
        let total_points: i64 = purchases.iter().map(|p| p.price).sum();
        let average_price = (count > 0)
            .then(|| Decimal::from(total_points) / Decimal::from(count as u64));
        Self {
            count,
            total_points,
            average_price,
        }
    }
}

/// One user's share of a purchase selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserBreakdown {
    pub user_id: UserId,
    pub purchases: usize,
    pub total_points: i64,
}

/// Purchase count and point sum per user, ordered by user id.
pub fn per_user_breakdown(purchases: &[Purchase]) -> Vec<UserBreakdown> {
    let mut rows: BTreeMap<u64, UserBreakdown> = BTreeMap::new();
    for purchase in purchases {
        let row = rows
            .entry(purchase.user_id.0)
            .or_insert_with(|| UserBreakdown {
                user_id: purchase.user_id,
                purchases: 0,
                total_points: 0,
            });
        row.purchases += 1;
        row.total_points += purchase.price;
    }
    rows.into_values().collect()
}

/// One reward's share of a purchase selection.
///
/// `reward_name` comes from the purchase snapshots, so it reflects the
/// name at purchase time even for since-renamed or deleted rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardBreakdown {
    pub reward_id: RewardId,
    pub reward_name: String,
    pub purchases: usize,
    pub total_points: i64,
}

/// Purchase count and point sum per reward, ordered by reward id.
pub fn per_reward_breakdown(purchases: &[Purchase]) -> Vec<RewardBreakdown> {
    let mut rows: BTreeMap<u64, RewardBreakdown> = BTreeMap::new();
    for purchase in purchases {
        let row = rows
            .entry(purchase.reward_id.0)
            .or_insert_with(|| RewardBreakdown {
                reward_id: purchase.reward_id,
                reward_name: purchase.reward_name.clone(),
                purchases: 0,
                total_points: 0,
            });
        row.purchases += 1;
        row.total_points += purchase.price;
    }
    rows.into_values().collect()
}

/// Aggregate view of the reward catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub average_price: Option<Decimal>,
}

impl CatalogStats {
    pub fn compute(rewards: &[Reward]) -> Self {
        let total = rewards.len();
        let available = rewards.iter().filter(|r| r.available).count();
        let min_price = rewards.iter().map(|r| r.price).min();
        let max_price = rewards.iter().map(|r| r.price).max();
        let average_price = (total > 0).then(|| {
            let sum: i64 = rewards.iter().map(|r| r.price).sum();
            Decimal::from(sum) / Decimal::from(total as u64)
        });
        Self {
            total,
            available,
            unavailable: total - available,
            min_price,
            max_price,
            average_price,
        }
    }
}
