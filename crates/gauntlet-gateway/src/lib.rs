// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway exposing the Gauntlet engine as a service.
//!
//! `POST /v1/runs` accepts `{identity, secret, url}`, validates the shared
//! secret, and solves the quiz chain on a background task; `GET /v1/runs/{id}`
//! reports progress or the final report; `GET /health` reports liveness only.

pub mod handlers;
pub mod server;

pub use server::{router, start_server, GatewayState, RunState};
