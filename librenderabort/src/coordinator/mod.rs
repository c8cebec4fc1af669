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

//! The render-abort and final-compositing coordination protocol.
//!
//! Every render cycle moves through `Idle`, `Interactive`, `FinalWait` and `Completed`:
//!
//! - While the frame is being produced, the render loop calls `interactive_poll` on each tick.
//!   The root consults its abort oracle and, on abort, sends `AbortRender` to every satellite.
//!   Satellites keep one receive posted on their link to the root and stop their frame as soon
//!   as `AbortRender` arrives. Polling never blocks.
//! - Once the frame has stopped, the render loop calls `final_rendezvous`. Satellites report
//!   `Finished` and block for the verdict. The root tells each satellite in ascending rank order
//!   that it is waiting, answers `CheckAbort` pings by consulting its oracle again, and moves on
//!   only once that satellite is finished. The verdict, `Composite` unless the cycle was
//!   aborted, is then sent to every satellite.
//!
//! A cluster with a single process skips all messaging.

mod builder;
mod local;
mod root;
mod satellite;
mod state;
#[cfg(test)]
mod testing;
mod unified;

pub use builder::RenderCoordinatorBuilder;
pub use local::LocalCoordinator;
pub use root::RootCoordinator;
pub use satellite::SatelliteCoordinator;
pub use state::RenderCycleState;
use state::CycleTracker;
pub use unified::RenderCoordinator;

/// The answer to an interactive poll.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PollOutcome {
    /// Stop producing the current frame.
    Abort,
    NoAbort,
}
