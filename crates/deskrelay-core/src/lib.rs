// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for deskrelay.
//!
//! Defines the error type, the domain types shared by every crate in the
//! workspace, and the capability traits (session store, message history,
//! policy and credential sources, remote desk) the handoff coordinator is
//! written against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RelayError;
pub use types::{
    ActionOutcome, AdapterType, Assignment, AssignmentReport, BotSession, ConversationKey,
    ConversationMessage, ConversationSnapshot, CoordinationPolicy, DeskCredential, HealthStatus,
    ManageAction, ManageRequest, ManageResponse, MessageDirection, PolicyOverride, RemoteStatus,
    SessionStatus, TenantId,
};

pub use traits::{
    CredentialSource, MessageHistory, PluginAdapter, PolicySource, RemoteDesk, SessionStore,
};
