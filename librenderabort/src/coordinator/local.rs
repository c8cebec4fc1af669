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

use crate::error::CoordinatorError;
use crate::frame::{AbortSignalSource, FrameSink};
use crate::message::Verdict;
use crate::Cycle;

use super::CycleTracker;
use super::PollOutcome;
use super::RenderCycleState;

/// The coordinator for a cluster of one: aborts come straight from the local oracle and no
/// messages are exchanged.
pub struct LocalCoordinator<A, F>
where
    A: AbortSignalSource,
    F: FrameSink,
{
    abort_source: A,
    frame_sink: F,
    aborted: bool,
    tracker: CycleTracker,
}

impl<A, F> LocalCoordinator<A, F>
where
    A: AbortSignalSource,
    F: FrameSink,
{
    pub fn new(abort_source: A, frame_sink: F) -> Self {
        LocalCoordinator {
            abort_source,
            frame_sink,
            aborted: false,
            tracker: CycleTracker::new(),
        }
    }

    pub fn cycle(&self) -> Cycle {
        self.tracker.cycle()
    }

    pub fn state(&self) -> RenderCycleState {
        self.tracker.state()
    }

    pub fn interactive_poll(&mut self) -> Result<PollOutcome, CoordinatorError> {
        self.tracker.begin_interactive()?;

        if self.abort_source.is_non_abortable() || !self.abort_source.should_abort() {
            return Ok(PollOutcome::NoAbort);
        }

        debug!("Cycle {}: aborting render", self.tracker.cycle());
        self.frame_sink.stop();
        self.aborted = true;
        Ok(PollOutcome::Abort)
    }

    /// Returns `AbortComposite` if any poll of this cycle aborted, `Composite` otherwise.
    pub fn final_rendezvous(&mut self) -> Result<Verdict, CoordinatorError> {
        self.tracker.begin_final_wait()?;

        let verdict = Verdict::from_aborted(self.aborted);
        self.aborted = false;
        self.tracker.complete(verdict);
        Ok(verdict)
    }
}
