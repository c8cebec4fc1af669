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

use std::convert::TryFrom;

use crate::error::{ChannelError, CoordinatorError, InvalidStateError};
use crate::frame::{AbortSignalSource, FrameSink};
use crate::links::MessageChannel;
use crate::message::{RenderMessage, RootMessage, Verdict};
use crate::topology::Rank;
use crate::Cycle;

use super::CycleTracker;
use super::PollOutcome;
use super::RenderCycleState;

/// The coordinator run by the root process.
///
/// The root owns the cluster-wide abort decision. While frames are being produced it consults
/// the local abort oracle and fans an abort out to every satellite. Once its own frame has
/// stopped it drains the satellites one at a time, in ascending rank order, and broadcasts the
/// compositing verdict.
pub struct RootCoordinator<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    rank: Rank,
    links: Vec<C>,
    abort_source: A,
    frame_sink: F,
    render_aborted: bool,
    tracker: CycleTracker,
}

impl<A, F, C> RootCoordinator<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    /// Creates a root coordinator with one link per satellite.
    ///
    /// # Errors
    ///
    /// An [`InvalidStateError`] is returned if a link leads back to `rank` or if two links lead
    /// to the same satellite.
    pub fn new(
        rank: Rank,
        mut links: Vec<C>,
        abort_source: A,
        frame_sink: F,
    ) -> Result<Self, InvalidStateError> {
        links.sort_by_key(|link| link.peer());

        if links.iter().any(|link| link.peer() == rank) {
            return Err(InvalidStateError::with_message(format!(
                "root {} can not have a link to itself",
                rank
            )));
        }
        if links.windows(2).any(|pair| pair[0].peer() == pair[1].peer()) {
            return Err(InvalidStateError::with_message(
                "each satellite must have exactly one link".into(),
            ));
        }

        Ok(RootCoordinator {
            rank,
            links,
            abort_source,
            frame_sink,
            render_aborted: false,
            tracker: CycleTracker::new(),
        })
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The satellite ranks, in the order they are drained.
    pub fn satellites(&self) -> Vec<Rank> {
        self.links.iter().map(|link| link.peer()).collect()
    }

    pub fn cycle(&self) -> Cycle {
        self.tracker.cycle()
    }

    pub fn state(&self) -> RenderCycleState {
        self.tracker.state()
    }

    /// Whether the root has decided that the current cycle's rendering must stop.
    pub fn render_aborted(&self) -> bool {
        self.render_aborted
    }

    /// Checks whether the in-progress frame should be aborted across the cluster.
    ///
    /// The common no-abort path performs no I/O. On abort, `AbortRender` is sent to every
    /// satellite with a blocking send and the local frame is stopped. Once a cycle is aborted,
    /// later polls report `Abort` without consulting the oracle or sending again.
    pub fn interactive_poll(&mut self) -> Result<PollOutcome, CoordinatorError> {
        self.tracker.begin_interactive()?;

        if self.render_aborted {
            return Ok(PollOutcome::Abort);
        }

        if self.abort_source.is_non_abortable() || !self.abort_source.should_abort() {
            trace!("Cycle {}: no abort requested", self.tracker.cycle());
            return Ok(PollOutcome::NoAbort);
        }

        debug!(
            "Cycle {}: aborting render on {} satellites",
            self.tracker.cycle(),
            self.links.len()
        );

        let result = self.broadcast(RenderMessage::AbortRender);
        self.frame_sink.stop();
        self.render_aborted = true;
        result?;

        Ok(PollOutcome::Abort)
    }

    /// Runs the final rendezvous and returns the verdict for this cycle.
    ///
    /// Each satellite in turn is told the root is waiting and is then drained until it reports
    /// `Finished`. `CheckAbort` pings received while waiting give the oracle another chance to
    /// abort the cycle. The verdict is sent to every satellite before it is returned.
    ///
    /// # Errors
    ///
    /// If any satellite can not be reached the cycle is abandoned and the channel error is
    /// returned.
    pub fn final_rendezvous(&mut self) -> Result<Verdict, CoordinatorError> {
        self.tracker.begin_final_wait()?;

        match self.drain_and_decide() {
            Ok(verdict) => {
                self.render_aborted = false;
                self.tracker.complete(verdict);
                Ok(verdict)
            }
            Err(err) => {
                error!(
                    "Cycle {}: final rendezvous failed: {}",
                    self.tracker.cycle(),
                    err
                );
                self.render_aborted = false;
                self.tracker.abandon();
                Err(err.into())
            }
        }
    }

    fn drain_and_decide(&mut self) -> Result<Verdict, ChannelError> {
        let cycle = self.tracker.cycle();

        for link in self.links.iter_mut() {
            let peer = link.peer();
            link.send(RenderMessage::RootWaiting)?;
            debug!("Cycle {}: waiting for rank {}", cycle, peer);

            loop {
                let message = link.receive()?;
                match RootMessage::try_from(message) {
                    Ok(RootMessage::Finished) => break,
                    Ok(RootMessage::CheckAbort) => {
                        if !self.render_aborted
                            && !self.abort_source.is_non_abortable()
                            && self.abort_source.should_abort()
                        {
                            debug!(
                                "Cycle {}: abort requested while waiting for rank {}",
                                cycle, peer
                            );
                            self.render_aborted = true;
                        }
                    }
                    Err(err) => warn!(
                        "Cycle {}: dropping message from rank {}: {}",
                        cycle, peer, err
                    ),
                }
            }

            debug!("Cycle {}: rank {} finished", cycle, peer);
        }

        let verdict = Verdict::from_aborted(self.render_aborted);
        self.broadcast(verdict.into())?;

        Ok(verdict)
    }

    // Sends to every satellite even if some are unreachable, returning the first failure.
    fn broadcast(&self, message: RenderMessage) -> Result<(), ChannelError> {
        let mut first_err = None;
        for link in &self.links {
            if let Err(err) = link.send(message) {
                error!(
                    "Unable to send {:?} to rank {}: {}",
                    message,
                    link.peer(),
                    err
                );
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
