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

use crate::error::InvalidStateError;
use crate::message::Verdict;
use crate::Cycle;

/// Where a coordinator is within the current render cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenderCycleState {
    /// No frame is in progress.
    Idle,
    /// The frame is being produced and may be aborted.
    Interactive,
    /// Frame production has stopped; the final rendezvous is running.
    FinalWait,
    /// The verdict for the cycle has been delivered.
    Completed(Verdict),
}

/// Tracks the cycle number and state transitions shared by every coordinator.
#[derive(Clone, Debug)]
pub(super) struct CycleTracker {
    cycle: Cycle,
    state: RenderCycleState,
}

impl CycleTracker {
    pub fn new() -> Self {
        CycleTracker {
            cycle: 0,
            state: RenderCycleState::Idle,
        }
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    pub fn state(&self) -> RenderCycleState {
        self.state
    }

    /// Moves into `Interactive`, starting a new cycle if the previous one has completed.
    ///
    /// Returns true if a new cycle was started by this call.
    pub fn begin_interactive(&mut self) -> Result<bool, InvalidStateError> {
        match self.state {
            RenderCycleState::Interactive => Ok(false),
            RenderCycleState::Idle => {
                self.state = RenderCycleState::Interactive;
                debug!("Cycle {}: Idle -> Interactive", self.cycle);
                Ok(true)
            }
            RenderCycleState::Completed(_) => {
                self.cycle += 1;
                self.state = RenderCycleState::Interactive;
                debug!("Cycle {}: Idle -> Interactive", self.cycle);
                Ok(true)
            }
            RenderCycleState::FinalWait => Err(InvalidStateError::with_message(format!(
                "cycle {} is in its final rendezvous and can not be polled",
                self.cycle
            ))),
        }
    }

    /// Moves into `FinalWait`, starting a new cycle first if the frame was never polled.
    pub fn begin_final_wait(&mut self) -> Result<(), InvalidStateError> {
        if self.state == RenderCycleState::FinalWait {
            return Err(InvalidStateError::with_message(format!(
                "cycle {} is already in its final rendezvous",
                self.cycle
            )));
        }

        self.begin_interactive()?;
        self.state = RenderCycleState::FinalWait;
        debug!("Cycle {}: Interactive -> FinalWait", self.cycle);
        Ok(())
    }

    pub fn complete(&mut self, verdict: Verdict) {
        self.state = RenderCycleState::Completed(verdict);
        debug!("Cycle {}: FinalWait -> Completed({:?})", self.cycle, verdict);
    }

    /// Gives up on the current cycle after a failure; the next poll starts a fresh cycle.
    pub fn abandon(&mut self) {
        warn!("Cycle {}: abandoned in state {:?}", self.cycle, self.state);
        self.cycle += 1;
        self.state = RenderCycleState::Idle;
    }
}
