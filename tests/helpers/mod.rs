// ABOUTME: Shared test helpers for integration tests
// ABOUTME: Exports the axum request/response test harness
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod axum_test;
