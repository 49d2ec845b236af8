// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot/human handoff coordination for deskrelay.
//!
//! [`HandoffCoordinator`] decides whether the bot may answer a message and
//! carries out the transfer, resolve, pause, and resume actions. It is
//! written against the capability traits in `deskrelay-core`, so any store or
//! desk implementation can be plugged in.

pub mod coordinator;
pub mod linker;
pub mod policy;

pub use coordinator::{strip_marker, HandoffCoordinator, TransferDetection};
pub use linker::ConversationLinker;
pub use policy::{merge, PolicyResolver};
