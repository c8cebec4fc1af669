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

use crate::error::{CoordinatorError, InvalidStateError, ProtocolViolationError};
use crate::frame::FrameSink;
use crate::links::{MessageChannel, PendingReceive};
use crate::message::{RenderMessage, SatelliteMessage, Verdict};
use crate::topology::Rank;
use crate::Cycle;

use super::CycleTracker;
use super::PollOutcome;
use super::RenderCycleState;

/// The coordinator run by every non-root process.
///
/// While the frame is in progress a satellite keeps exactly one asynchronous receive posted on
/// its link to the root, so an `AbortRender` is noticed on the next poll. Once the root reports
/// that it is waiting, each poll also pings the root with `CheckAbort`.
pub struct SatelliteCoordinator<F, C>
where
    F: FrameSink,
    C: MessageChannel,
{
    rank: Rank,
    link: C,
    frame_sink: F,
    pending: PendingReceive<C::Receive>,
    root_waiting: bool,
    violated: bool,
    tracker: CycleTracker,
}

impl<F, C> SatelliteCoordinator<F, C>
where
    F: FrameSink,
    C: MessageChannel,
{
    /// Creates a satellite coordinator talking to the root over `link`.
    ///
    /// # Errors
    ///
    /// An [`InvalidStateError`] is returned if `link` leads back to `rank`.
    pub fn new(rank: Rank, link: C, frame_sink: F) -> Result<Self, InvalidStateError> {
        if link.peer() == rank {
            return Err(InvalidStateError::with_message(format!(
                "satellite {} can not be its own root",
                rank
            )));
        }

        Ok(SatelliteCoordinator {
            rank,
            link,
            frame_sink,
            pending: PendingReceive::new(),
            root_waiting: false,
            violated: false,
            tracker: CycleTracker::new(),
        })
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn link(&self) -> &C {
        &self.link
    }

    pub fn cycle(&self) -> Cycle {
        self.tracker.cycle()
    }

    pub fn state(&self) -> RenderCycleState {
        self.tracker.state()
    }

    /// Whether the root has reported that it is blocked waiting for this satellite.
    pub fn root_waiting(&self) -> bool {
        self.root_waiting
    }

    /// Whether a receive is currently posted on the link to the root.
    pub fn is_armed(&self) -> bool {
        self.pending.is_armed()
    }

    /// Ensures exactly one receive is posted on the link to the root.
    pub fn arm(&mut self) -> Result<(), CoordinatorError> {
        self.pending.arm(&mut self.link)?;
        Ok(())
    }

    /// Checks, without blocking, whether the root has asked this satellite to abort.
    ///
    /// At most one message from the root is consumed per poll, and a receive is left posted
    /// afterwards.
    ///
    /// # Errors
    ///
    /// A message the root may never send during the interactive phase stops the local frame and
    /// is returned as a [`CoordinatorError::ProtocolViolation`]; the cycle will end with
    /// `AbortComposite` on this process.
    pub fn interactive_poll(&mut self) -> Result<PollOutcome, CoordinatorError> {
        self.tracker.begin_interactive()?;

        if self.root_waiting {
            self.link.send_nowait(RenderMessage::CheckAbort)?;
        }

        self.arm()?;
        let message = match self.pending.poll(&mut self.link)? {
            Some(message) => message,
            None => {
                trace!("Cycle {}: nothing from the root", self.tracker.cycle());
                return Ok(PollOutcome::NoAbort);
            }
        };

        debug!(
            "Cycle {}: received {:?} from the root",
            self.tracker.cycle(),
            message
        );

        let outcome = match SatelliteMessage::try_from(message) {
            Ok(SatelliteMessage::AbortRender) => {
                self.frame_sink.stop();
                Ok(PollOutcome::Abort)
            }
            Ok(SatelliteMessage::RootWaiting) => {
                self.root_waiting = true;
                Ok(PollOutcome::NoAbort)
            }
            Ok(SatelliteMessage::Verdict(_)) | Err(_) => {
                let violation = self.violation(message);
                self.frame_sink.stop();
                self.violated = true;
                Err(violation.into())
            }
        };

        // The consumed message has been acted on; a failed re-arm is retried by the next poll,
        // which reports the error if the link is still unusable.
        if let Err(err) = self.arm() {
            error!(
                "Cycle {}: unable to re-arm receive from the root: {}",
                self.tracker.cycle(),
                err
            );
        }

        outcome
    }

    /// Reports this satellite as finished and blocks until the root's verdict arrives.
    ///
    /// Any receive still posted from the interactive phase is cancelled first. `AbortRender` and
    /// `RootWaiting` may still be in flight from that phase and are ignored.
    ///
    /// # Errors
    ///
    /// If the root can not be reached the cycle is abandoned and the channel error is returned.
    /// If the root sends a message it never legally sends here, the rest of the rendezvous still
    /// runs so the link stays in step, and the violation is returned in place of the verdict.
    pub fn final_rendezvous(&mut self) -> Result<Verdict, CoordinatorError> {
        self.tracker.begin_final_wait()?;
        self.root_waiting = false;

        match self.await_verdict() {
            Ok((verdict, None)) => {
                let verdict = if self.violated {
                    warn!(
                        "Cycle {}: forcing AbortComposite after a protocol violation",
                        self.tracker.cycle()
                    );
                    Verdict::AbortComposite
                } else {
                    verdict
                };
                self.finish_cycle(verdict);
                Ok(verdict)
            }
            Ok((_, Some(violation))) => {
                self.finish_cycle(violation.forced_verdict());
                Err(violation.into())
            }
            Err(err) => {
                error!(
                    "Cycle {}: final rendezvous failed: {}",
                    self.tracker.cycle(),
                    err
                );
                self.root_waiting = false;
                self.violated = false;
                self.tracker.abandon();
                Err(err)
            }
        }
    }

    // Returns the root's verdict and the first protocol violation seen while waiting for it.
    fn await_verdict(
        &mut self,
    ) -> Result<(Verdict, Option<ProtocolViolationError>), CoordinatorError> {
        let mut violation = None;

        if let Some(message) = self.pending.cancel(&mut self.link)? {
            warn!(
                "Cycle {}: {:?} arrived while cancelling the pending receive",
                self.tracker.cycle(),
                message
            );
            if let Err(err) = self.absorb_stray(message) {
                violation = Some(err);
            }
        }

        self.link.send(RenderMessage::Finished)?;

        loop {
            let message = self.link.receive()?;
            match SatelliteMessage::try_from(message) {
                Ok(SatelliteMessage::Verdict(verdict)) => {
                    debug!(
                        "Cycle {}: root decided {:?}",
                        self.tracker.cycle(),
                        verdict
                    );
                    return Ok((verdict, violation));
                }
                _ => {
                    if let Err(err) = self.absorb_stray(message) {
                        if violation.is_none() {
                            violation = Some(err);
                        }
                    }
                }
            }
        }
    }

    // Messages left over from the interactive phase are dropped; anything else before the
    // verdict is a violation.
    fn absorb_stray(&self, message: RenderMessage) -> Result<(), ProtocolViolationError> {
        match message {
            RenderMessage::AbortRender | RenderMessage::RootWaiting => {
                debug!(
                    "Cycle {}: ignoring stray {:?}",
                    self.tracker.cycle(),
                    message
                );
                Ok(())
            }
            _ => Err(self.violation(message)),
        }
    }

    fn violation(&self, message: RenderMessage) -> ProtocolViolationError {
        let violation =
            ProtocolViolationError::new(self.link.peer(), message, self.tracker.state());
        error!("Cycle {}: {}", self.tracker.cycle(), violation);
        violation
    }

    fn finish_cycle(&mut self, verdict: Verdict) {
        self.root_waiting = false;
        self.violated = false;
        self.tracker.complete(verdict);
    }
}

#[cfg(all(test, feature = "memory-link"))]
mod tests {
    use super::*;

    use std::thread;

    use proptest::prelude::*;

    use crate::frame::StopFlag;
    use crate::links::memory::MemoryLink;

    fn satellite() -> (SatelliteCoordinator<StopFlag, MemoryLink>, MemoryLink, StopFlag) {
        let (root_end, satellite_end) = MemoryLink::pair(0, 1);
        let stop = StopFlag::new();
        let satellite = SatelliteCoordinator::new(1, satellite_end, stop.clone())
            .expect("valid satellite");
        (satellite, root_end, stop)
    }

    // Plays the root's side of a rendezvous: waits for `Finished`, then sends the verdict after
    // any extra messages.
    fn answer(
        mut root_end: MemoryLink,
        extra: Vec<RenderMessage>,
        verdict: Verdict,
    ) -> thread::JoinHandle<MemoryLink> {
        thread::spawn(move || {
            loop {
                match root_end.receive() {
                    Ok(RenderMessage::Finished) => break,
                    Ok(_) => continue,
                    Err(err) => panic!("root end failed: {}", err),
                }
            }
            for message in extra {
                root_end.send(message).expect("send extra");
            }
            root_end.send(verdict.into()).expect("send verdict");
            root_end
        })
    }

    #[test]
    fn test_poll_keeps_one_receive_armed() -> Result<(), Box<dyn std::error::Error>> {
        let (mut satellite, _root_end, _stop) = satellite();

        for _ in 0..10 {
            assert_eq!(satellite.interactive_poll()?, PollOutcome::NoAbort);
            assert!(satellite.is_armed());
            assert_eq!(satellite.link().posted_receives(), 1);
        }

        Ok(())
    }

    #[test]
    fn test_abort_render_stops_frame() -> Result<(), Box<dyn std::error::Error>> {
        let (mut satellite, root_end, stop) = satellite();

        root_end.send(RenderMessage::AbortRender)?;
        assert_eq!(satellite.interactive_poll()?, PollOutcome::Abort);
        assert!(stop.is_stopped());
        assert_eq!(satellite.link().posted_receives(), 1);

        Ok(())
    }

    /// Test that a frame already stopped locally tolerates a later `AbortRender`.
    #[test]
    fn test_delayed_abort_render_after_local_stop() -> Result<(), Box<dyn std::error::Error>> {
        let (mut satellite, root_end, stop) = satellite();
        let mut render_loop = stop.clone();

        render_loop.stop();
        root_end.send(RenderMessage::AbortRender)?;
        assert_eq!(satellite.interactive_poll()?, PollOutcome::Abort);

        assert!(stop.is_stopped());
        assert_eq!(stop.requests(), 2);

        Ok(())
    }

    /// Test that `CheckAbort` pings only start once the root reports it is waiting.
    #[test]
    fn test_pings_only_while_root_waiting() -> Result<(), Box<dyn std::error::Error>> {
        let (mut satellite, mut root_end, _stop) = satellite();
        let mut posted = PendingReceive::new();

        satellite.interactive_poll()?;
        posted.arm(&mut root_end)?;
        assert_eq!(posted.poll(&mut root_end)?, None);

        root_end.send(RenderMessage::RootWaiting)?;
        assert_eq!(satellite.interactive_poll()?, PollOutcome::NoAbort);
        assert!(satellite.root_waiting());
        assert_eq!(posted.poll(&mut root_end)?, None);

        satellite.interactive_poll()?;
        satellite.interactive_poll()?;
        assert_eq!(posted.poll(&mut root_end)?, Some(RenderMessage::CheckAbort));
        assert_eq!(root_end.receive()?, RenderMessage::CheckAbort);

        Ok(())
    }

    #[test]
    fn test_final_rendezvous_returns_root_verdict() -> Result<(), Box<dyn std::error::Error>> {
        let (mut satellite, root_end, _stop) = satellite();

        satellite.interactive_poll()?;
        let root = answer(root_end, vec![], Verdict::AbortComposite);

        assert_eq!(satellite.final_rendezvous()?, Verdict::AbortComposite);
        assert!(!satellite.is_armed());
        assert_eq!(satellite.link().posted_receives(), 0);
        assert_eq!(
            satellite.state(),
            RenderCycleState::Completed(Verdict::AbortComposite)
        );
        root.join().expect("root thread");

        Ok(())
    }

    /// Test that messages left over from the interactive phase, including one caught by the
    /// cancellation of the pending receive, do not change the verdict.
    #[test]
    fn test_stray_messages_in_final_wait() -> Result<(), Box<dyn std::error::Error>> {
        let (mut satellite, root_end, _stop) = satellite();

        satellite.interactive_poll()?;
        root_end.send(RenderMessage::RootWaiting)?;
        let root = answer(
            root_end,
            vec![RenderMessage::AbortRender, RenderMessage::RootWaiting],
            Verdict::Composite,
        );

        assert_eq!(satellite.final_rendezvous()?, Verdict::Composite);
        assert!(!satellite.root_waiting());
        root.join().expect("root thread");

        Ok(())
    }

    #[test]
    fn test_violation_during_poll_forces_abort_composite(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (mut satellite, root_end, stop) = satellite();

        root_end.send(RenderMessage::Composite)?;
        match satellite.interactive_poll() {
            Err(CoordinatorError::ProtocolViolation(violation)) => {
                assert_eq!(violation.message(), RenderMessage::Composite);
                assert_eq!(violation.peer(), 0);
                assert_eq!(violation.state(), RenderCycleState::Interactive);
            }
            other => panic!("expected a protocol violation, got {:?}", other),
        }
        assert!(stop.is_stopped());
        assert!(satellite.is_armed());

        let root = answer(root_end, vec![], Verdict::Composite);
        assert_eq!(satellite.final_rendezvous()?, Verdict::AbortComposite);
        let root_end = root.join().expect("root thread");

        // The next cycle is unaffected.
        let root = answer(root_end, vec![], Verdict::Composite);
        assert_eq!(satellite.final_rendezvous()?, Verdict::Composite);
        root.join().expect("root thread");

        Ok(())
    }

    #[test]
    fn test_violation_during_final_wait() {
        let (mut satellite, root_end, _stop) = satellite();

        let root = answer(root_end, vec![RenderMessage::Finished], Verdict::Composite);
        let err = satellite
            .final_rendezvous()
            .expect_err("expected a protocol violation");

        assert_eq!(err.forced_verdict(), Some(Verdict::AbortComposite));
        assert_eq!(
            satellite.state(),
            RenderCycleState::Completed(Verdict::AbortComposite)
        );
        root.join().expect("root thread");
    }

    #[test]
    fn test_lost_root_is_detected() -> Result<(), Box<dyn std::error::Error>> {
        let (root_end, satellite_end) = MemoryLink::pair(0, 1);
        let satellite_end =
            satellite_end.with_receive_timeout(std::time::Duration::from_millis(20));
        let mut satellite = SatelliteCoordinator::new(1, satellite_end, StopFlag::new())?;

        satellite.interactive_poll()?;
        assert!(matches!(
            satellite.final_rendezvous(),
            Err(CoordinatorError::Channel(_))
        ));
        assert_eq!(satellite.state(), RenderCycleState::Idle);

        drop(root_end);
        assert!(matches!(
            satellite.final_rendezvous(),
            Err(CoordinatorError::Channel(_))
        ));

        Ok(())
    }

    proptest! {
        /// However root messages and polls interleave, a single receive stays posted.
        #[test]
        fn prop_single_outstanding_receive(ops in proptest::collection::vec(0u8..3, 0..64)) {
            let (mut satellite, root_end, _stop) = satellite();

            for op in ops {
                match op {
                    0 => root_end.send(RenderMessage::RootWaiting).unwrap(),
                    1 => root_end.send(RenderMessage::AbortRender).unwrap(),
                    _ => {
                        satellite.interactive_poll().unwrap();
                        prop_assert!(satellite.is_armed());
                        prop_assert_eq!(satellite.link().posted_receives(), 1);
                    }
                }
                prop_assert!(satellite.link().posted_receives() <= 1);
            }
        }
    }
}
