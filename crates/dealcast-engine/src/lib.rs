// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign posting engine.
//!
//! Ties the storage layer and the external collaborators together:
//! - [`lifecycle`]: user-facing campaign and timing operations with the start gate
//! - [`population`]: on-demand queue population under the `preparing` status gate
//! - [`discovery`]: the periodic refill and retention cycle
//! - [`scheduler`]: the fixed-interval posting tick
//! - [`conflicts`]: channel overlap between running campaigns (query only)

pub mod conflicts;
pub mod discovery;
pub mod lifecycle;
pub mod population;
pub mod recording;
pub mod scheduler;
pub mod shutdown;
pub mod timing;

pub use conflicts::{ChannelConflict, conflicting_channels};
pub use discovery::{DiscoveryCycle, DiscoveryReport, DiscoverySettings, RefillSettings, RefillStats};
pub use lifecycle::{CampaignService, CampaignSummary};
pub use population::{PopulationMode, PopulationOutcome, Populator};
pub use scheduler::{PostingScheduler, TickReport};
pub use timing::TickClock;
