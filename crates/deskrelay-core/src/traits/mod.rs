// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits the coordinator depends on.
//!
//! Every trait uses `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` and swapped for in-memory fakes in tests.

pub mod adapter;
pub mod desk;
pub mod source;
pub mod storage;

pub use adapter::PluginAdapter;
pub use desk::RemoteDesk;
pub use source::{CredentialSource, PolicySource};
pub use storage::{MessageHistory, SessionStore};
