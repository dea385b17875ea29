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

//! # Reward Ledger
//!
//! This library provides the reward economy core of a points-based reward
//! store: a reward catalog, a purchase ledger with an approval lifecycle
//! (pending, approved, rejected, completed, cancelled), and the point
//! bookkeeping that keeps user balances consistent with that lifecycle.
//!
//! ## Core Components
//!
//! - [`RewardCatalog`]: reward definitions — price, availability, stock
//! - [`PurchaseLedger`]: the purchase state machine and the paired point
//!   debit/credit for each transition
//! - [`UserDirectory`]: user points balances, writable only through the
//!   ledger
//! - [`stats`]: read-only aggregation over purchases and rewards
//!
//! ## Example
//!
//! ```
//! use reward_ledger_rs::{PurchaseLedger, RewardCatalog, RewardDraft, UserDirectory, UserId};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(RewardCatalog::new());
//! let directory = Arc::new(UserDirectory::new());
//! let ledger = PurchaseLedger::new(Arc::clone(&catalog), Arc::clone(&directory));
//!
//! directory.register(UserId(1), 200).unwrap();
//! let reward = catalog
//!     .create(RewardDraft {
//!         name: "Coffee voucher".to_string(),
//!         description: None,
//!         price: 80,
//!         available: true,
//!         stock: None,
//!     })
//!     .unwrap();
//!
//! // Purchase debits the price and leaves the request pending approval.
//! let purchase = ledger.create(UserId(1), reward.id).unwrap();
//! assert_eq!(directory.balance(UserId(1)).unwrap(), 120);
//!
//! // Rejecting refunds the snapshot price.
//! ledger.reject(purchase.id).unwrap();
//! assert_eq!(directory.balance(UserId(1)).unwrap(), 200);
//! ```
//!
//! ## Thread Safety
//!
//! All engine operations take `&self` and are safe to call from concurrent
//! requests; operations on the same purchase serialize, operations on
//! different purchases and users run in parallel.

pub mod account;
mod base;
mod catalog;
pub mod error;
mod ledger;
pub mod purchase;
pub mod reward;
pub mod stats;

pub use account::{PointsAccount, UserDirectory};
pub use base::{PurchaseId, RewardId, UserId};
pub use catalog::RewardCatalog;
pub use error::LedgerError;
pub use ledger::{BulkOutcome, PurchaseLedger};
pub use purchase::{next_status, Purchase, PurchaseAction, PurchaseStatus};
pub use reward::{Purchasability, Reward, RewardDraft, RewardPatch};
