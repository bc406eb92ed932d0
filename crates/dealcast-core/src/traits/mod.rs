// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the engine's collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod notify;
pub mod search;
pub mod storage;
pub mod transport;

pub use adapter::PluginAdapter;
pub use notify::NotificationSink;
pub use search::{SearchProvider, SearchRequest};
pub use storage::StorageAdapter;
pub use transport::PostingTransport;
