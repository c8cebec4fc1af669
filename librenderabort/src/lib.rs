// Copyright 2021-2022 Cargill Incorporated
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Render-abort and final-compositing coordination for a cluster of processes which jointly
//! render and composite a single image.
//!
//! One process, the root, arbitrates interactive aborts for the whole cluster. Every other
//! process is a satellite. Each render cycle has an interactive phase, during which any process
//! may be told to stop producing its frame, followed by a final rendezvous in which the root
//! drains every satellite in rank order and broadcasts whether compositing runs.

#[macro_use]
extern crate log;

#[cfg(feature = "coordinator")]
pub mod coordinator;
pub mod error;
pub mod frame;
pub mod links;
mod message;
mod topology;

#[cfg(feature = "coordinator")]
pub use coordinator::{
    LocalCoordinator, PollOutcome, RenderCoordinator, RenderCoordinatorBuilder,
    RenderCycleState, RootCoordinator, SatelliteCoordinator,
};
pub use frame::{AbortSignalSource, FrameSink, StopFlag};
pub use message::{RenderMessage, RootMessage, SatelliteMessage, Verdict};
pub use topology::{ClusterTopology, ProcessRole, Rank};

/// The sequence number of a single render cycle.
///
/// A cycle starts when the first interactive poll of a frame is made and ends once the
/// compositing verdict has been delivered. Coordinators count cycles from zero.
pub type Cycle = u64;
