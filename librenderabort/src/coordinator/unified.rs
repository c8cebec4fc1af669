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

use crate::error::{CoordinatorError, InvalidStateError};
use crate::frame::{AbortSignalSource, FrameSink};
use crate::links::MessageChannel;
use crate::message::Verdict;
use crate::topology::ProcessRole;
use crate::Cycle;

use super::LocalCoordinator;
use super::PollOutcome;
use super::RenderCycleState;
use super::RootCoordinator;
use super::SatelliteCoordinator;

enum InnerCoordinator<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    Root(RootCoordinator<A, F, C>),
    Satellite(SatelliteCoordinator<F, C>),
    Local(LocalCoordinator<A, F>),
}

/// A coordinator for any process of the cluster.
///
/// The render loop drives every process the same way: `interactive_poll` once per progress
/// tick while the frame is produced, then `final_rendezvous` exactly once after production
/// stops. Which protocol runs underneath depends on the process's role.
pub struct RenderCoordinator<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    inner: InnerCoordinator<A, F, C>,
}

impl<A, F, C> RenderCoordinator<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    /// The role of this process. A single-process cluster is its own root.
    pub fn role(&self) -> ProcessRole {
        match &self.inner {
            InnerCoordinator::Root(_) | InnerCoordinator::Local(_) => ProcessRole::Root,
            InnerCoordinator::Satellite(_) => ProcessRole::Satellite,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.inner, InnerCoordinator::Local(_))
    }

    pub fn cycle(&self) -> Cycle {
        match &self.inner {
            InnerCoordinator::Root(c) => c.cycle(),
            InnerCoordinator::Satellite(c) => c.cycle(),
            InnerCoordinator::Local(c) => c.cycle(),
        }
    }

    pub fn state(&self) -> RenderCycleState {
        match &self.inner {
            InnerCoordinator::Root(c) => c.state(),
            InnerCoordinator::Satellite(c) => c.state(),
            InnerCoordinator::Local(c) => c.state(),
        }
    }

    pub fn interactive_poll(&mut self) -> Result<PollOutcome, CoordinatorError> {
        match &mut self.inner {
            InnerCoordinator::Root(c) => c.interactive_poll(),
            InnerCoordinator::Satellite(c) => c.interactive_poll(),
            InnerCoordinator::Local(c) => c.interactive_poll(),
        }
    }

    pub fn final_rendezvous(&mut self) -> Result<Verdict, CoordinatorError> {
        match &mut self.inner {
            InnerCoordinator::Root(c) => c.final_rendezvous(),
            InnerCoordinator::Satellite(c) => c.final_rendezvous(),
            InnerCoordinator::Local(c) => c.final_rendezvous(),
        }
    }
}

impl<A, F, C> From<RootCoordinator<A, F, C>> for RenderCoordinator<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    fn from(coordinator: RootCoordinator<A, F, C>) -> Self {
        Self {
            inner: InnerCoordinator::Root(coordinator),
        }
    }
}

impl<A, F, C> From<SatelliteCoordinator<F, C>> for RenderCoordinator<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    fn from(coordinator: SatelliteCoordinator<F, C>) -> Self {
        Self {
            inner: InnerCoordinator::Satellite(coordinator),
        }
    }
}

impl<A, F, C> From<LocalCoordinator<A, F>> for RenderCoordinator<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    fn from(coordinator: LocalCoordinator<A, F>) -> Self {
        Self {
            inner: InnerCoordinator::Local(coordinator),
        }
    }
}

impl<A, F, C> TryFrom<RenderCoordinator<A, F, C>> for RootCoordinator<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    type Error = InvalidStateError;

    fn try_from(coordinator: RenderCoordinator<A, F, C>) -> Result<Self, Self::Error> {
        match coordinator.inner {
            InnerCoordinator::Root(c) => Ok(c),
            InnerCoordinator::Satellite(_) | InnerCoordinator::Local(_) => {
                Err(InvalidStateError::with_message(
                    "unable to convert RenderCoordinator to RootCoordinator \
                    because inner coordinator is not a cluster root"
                        .into(),
                ))
            }
        }
    }
}

impl<A, F, C> TryFrom<RenderCoordinator<A, F, C>> for SatelliteCoordinator<F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    type Error = InvalidStateError;

    fn try_from(coordinator: RenderCoordinator<A, F, C>) -> Result<Self, Self::Error> {
        match coordinator.inner {
            InnerCoordinator::Satellite(c) => Ok(c),
            InnerCoordinator::Root(_) | InnerCoordinator::Local(_) => {
                Err(InvalidStateError::with_message(
                    "unable to convert RenderCoordinator to SatelliteCoordinator \
                    because inner coordinator is not a satellite"
                        .into(),
                ))
            }
        }
    }
}

impl<A, F, C> TryFrom<RenderCoordinator<A, F, C>> for LocalCoordinator<A, F>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    type Error = InvalidStateError;

    fn try_from(coordinator: RenderCoordinator<A, F, C>) -> Result<Self, Self::Error> {
        match coordinator.inner {
            InnerCoordinator::Local(c) => Ok(c),
            InnerCoordinator::Root(_) | InnerCoordinator::Satellite(_) => {
                Err(InvalidStateError::with_message(
                    "unable to convert RenderCoordinator to LocalCoordinator \
                    because inner coordinator is part of a cluster"
                        .into(),
                ))
            }
        }
    }
}
