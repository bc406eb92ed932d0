// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Dealcast integration tests.
//!
//! Provides mock collaborators and a temp-database harness for fast,
//! deterministic tests without network access.
//!
//! # Components
//!
//! - [`MockSearchProvider`] - Scripted search results with request capture and an optional gate
//! - [`MockTransport`] - Posting transport that records deliveries
//! - [`MockNotifier`] - Notification sink that records what was sent
//! - [`TestHarness`] - Initialized SQLite storage in a temp directory plus the mocks

pub mod fixtures;
pub mod harness;
pub mod mock_notifier;
pub mod mock_search;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_notifier::MockNotifier;
pub use mock_search::MockSearchProvider;
pub use mock_transport::MockTransport;
