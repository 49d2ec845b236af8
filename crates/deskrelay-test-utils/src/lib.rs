// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for deskrelay.
//!
//! In-memory implementations of every capability trait the coordinator is
//! written against, each with call counters so tests can assert that a code
//! path touched nothing.
//!
//! # Components
//!
//! - [`MemorySessionStore`] / [`MemoryHistory`] - session rows and message history
//! - [`StaticPolicySource`] / [`StaticCredentials`] - per-tenant settings
//! - [`MockDesk`] - scripted remote desk that records every call
//! - [`CoordinatorHarness`] - a coordinator wired to all of the above

pub mod harness;
pub mod mock_desk;
pub mod mock_sources;
pub mod mock_store;

pub use harness::{CoordinatorHarness, CoordinatorHarnessBuilder};
pub use mock_desk::{DeskCall, MockDesk};
pub use mock_sources::{disabled_credential, usable_credential, StaticCredentials, StaticPolicySource};
pub use mock_store::{MemoryHistory, MemorySessionStore};
