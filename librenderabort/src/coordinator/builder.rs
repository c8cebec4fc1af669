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
use crate::frame::{AbortSignalSource, FrameSink};
use crate::links::MessageChannel;
use crate::topology::{ClusterTopology, ProcessRole};

use super::LocalCoordinator;
use super::RenderCoordinator;
use super::RootCoordinator;
use super::SatelliteCoordinator;

/// Assembles a [`RenderCoordinator`] for the role this process plays in the topology.
///
/// A topology with a single process produces a coordinator which never sends messages, in
/// which case no links may be given. The root needs one link per satellite and an abort source;
/// a satellite needs exactly one link, to the root, and ignores any abort source.
pub struct RenderCoordinatorBuilder<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    topology: Option<ClusterTopology>,
    abort_source: Option<A>,
    frame_sink: Option<F>,
    links: Vec<C>,
}

impl<A, F, C> Default for RenderCoordinatorBuilder<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, F, C> RenderCoordinatorBuilder<A, F, C>
where
    A: AbortSignalSource,
    F: FrameSink,
    C: MessageChannel,
{
    pub fn new() -> Self {
        Self {
            topology: None,
            abort_source: None,
            frame_sink: None,
            links: Vec::new(),
        }
    }

    pub fn with_topology(mut self, topology: ClusterTopology) -> Self {
        self.topology = Some(topology);
        self
    }

    pub fn with_abort_source(mut self, abort_source: A) -> Self {
        self.abort_source = Some(abort_source);
        self
    }

    pub fn with_frame_sink(mut self, frame_sink: F) -> Self {
        self.frame_sink = Some(frame_sink);
        self
    }

    pub fn with_link(mut self, link: C) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_links<I>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        self.links.extend(links);
        self
    }

    pub fn build(self) -> Result<RenderCoordinator<A, F, C>, InvalidStateError> {
        let topology = self
            .topology
            .ok_or_else(|| InvalidStateError::with_message("missing topology field".into()))?;

        let frame_sink = self
            .frame_sink
            .ok_or_else(|| InvalidStateError::with_message("missing frame_sink field".into()))?;

        let mut peers: Vec<_> = self.links.iter().map(|link| link.peer()).collect();
        peers.sort_unstable();
        let expected = if topology.is_single_process() {
            vec![]
        } else {
            topology.peer_ranks()
        };
        if peers != expected {
            return Err(InvalidStateError::with_message(format!(
                "rank {} needs links to {:?}, but links to {:?} were given",
                topology.this_rank(),
                expected,
                peers
            )));
        }

        if topology.is_single_process() {
            let abort_source = self.abort_source.ok_or_else(|| {
                InvalidStateError::with_message("missing abort_source field".into())
            })?;
            debug!("Building single-process coordinator");
            return Ok(LocalCoordinator::new(abort_source, frame_sink).into());
        }

        match topology.role() {
            ProcessRole::Root => {
                let abort_source = self.abort_source.ok_or_else(|| {
                    InvalidStateError::with_message("missing abort_source field".into())
                })?;
                debug!(
                    "Building root coordinator for rank {} with satellites {:?}",
                    topology.this_rank(),
                    expected
                );
                Ok(RootCoordinator::new(
                    topology.this_rank(),
                    self.links,
                    abort_source,
                    frame_sink,
                )?
                .into())
            }
            ProcessRole::Satellite => {
                let link = self.links.into_iter().next().ok_or_else(|| {
                    InvalidStateError::with_message("missing link to the root".into())
                })?;
                debug!(
                    "Building satellite coordinator for rank {} with root {}",
                    topology.this_rank(),
                    topology.root()
                );
                Ok(SatelliteCoordinator::new(topology.this_rank(), link, frame_sink)?.into())
            }
        }
    }
}
