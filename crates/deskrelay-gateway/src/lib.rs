// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the deskrelay handoff coordinator.
//!
//! Exposes the coordination API under `/v1/tenants/{tenant}` behind bearer
//! auth, plus an unauthenticated `/health` endpoint.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use handlers::normalize_key;
pub use server::{build_router, start_server, GatewayState, HealthState};
