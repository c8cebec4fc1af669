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

//! An in-process link built on `crossbeam-channel`.
//!
//! Useful when every process of a cluster is a thread of the same host process, and for tests.
//! A receive posted on a memory link is matched by the first message already queued, which gives
//! cancellation the same race as a network transport: a message queued before the cancel is
//! handed back to the canceller.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};

use crate::error::{ChannelError, InternalError};
use crate::message::RenderMessage;
use crate::topology::Rank;

use super::MessageChannel;

/// A posted receive on a [`MemoryLink`].
#[derive(Debug)]
pub struct MemoryReceive {
    _private: (),
}

/// One end of an in-process link.
#[derive(Debug)]
pub struct MemoryLink {
    peer: Rank,
    sender: Sender<RenderMessage>,
    receiver: Receiver<RenderMessage>,
    receive_timeout: Option<Duration>,
    posted: usize,
}

impl MemoryLink {
    /// Creates both ends of a link between `local` and `peer`.
    ///
    /// The first link returned belongs to `local`, the second to `peer`.
    pub fn pair(local: Rank, peer: Rank) -> (MemoryLink, MemoryLink) {
        let (to_peer, from_local) = crossbeam_channel::unbounded();
        let (to_local, from_peer) = crossbeam_channel::unbounded();

        (
            MemoryLink::new(peer, to_peer, from_peer),
            MemoryLink::new(local, to_local, from_local),
        )
    }

    fn new(peer: Rank, sender: Sender<RenderMessage>, receiver: Receiver<RenderMessage>) -> Self {
        MemoryLink {
            peer,
            sender,
            receiver,
            receive_timeout: None,
            posted: 0,
        }
    }

    /// Bounds every blocking receive; a receive that times out fails with
    /// [`ChannelError::Timeout`].
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// The number of asynchronous receives posted on this end and not yet completed or
    /// cancelled.
    pub fn posted_receives(&self) -> usize {
        self.posted
    }

    fn complete_receive(&mut self) {
        self.posted -= 1;
    }
}

impl MessageChannel for MemoryLink {
    type Receive = MemoryReceive;

    fn peer(&self) -> Rank {
        self.peer
    }

    fn send(&self, message: RenderMessage) -> Result<(), ChannelError> {
        self.sender
            .send(message)
            .map_err(|_| ChannelError::Disconnected { peer: self.peer })
    }

    fn send_nowait(&self, message: RenderMessage) -> Result<(), ChannelError> {
        self.sender.try_send(message).map_err(|err| match err {
            TrySendError::Disconnected(_) => ChannelError::Disconnected { peer: self.peer },
            TrySendError::Full(message) => ChannelError::Internal(InternalError::with_message(
                format!("link to rank {} is full, {:?} not sent", self.peer, message),
            )),
        })
    }

    fn receive(&mut self) -> Result<RenderMessage, ChannelError> {
        match self.receive_timeout {
            Some(timeout) => self.receiver.recv_timeout(timeout).map_err(|err| match err {
                RecvTimeoutError::Timeout => ChannelError::Timeout {
                    peer: self.peer,
                    timeout,
                },
                RecvTimeoutError::Disconnected => ChannelError::Disconnected { peer: self.peer },
            }),
            None => self
                .receiver
                .recv()
                .map_err(|_| ChannelError::Disconnected { peer: self.peer }),
        }
    }

    fn post_receive(&mut self) -> Result<Self::Receive, ChannelError> {
        self.posted += 1;
        Ok(MemoryReceive { _private: () })
    }

    fn test_receive(
        &mut self,
        _receive: &mut Self::Receive,
    ) -> Result<Option<RenderMessage>, ChannelError> {
        match self.receiver.try_recv() {
            Ok(message) => {
                self.complete_receive();
                Ok(Some(message))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelError::Disconnected { peer: self.peer }),
        }
    }

    fn cancel_receive(
        &mut self,
        _receive: Self::Receive,
    ) -> Result<Option<RenderMessage>, ChannelError> {
        self.complete_receive();
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }
}

/// Creates the links of a star-shaped cluster around `root`.
///
/// Returns the root's links, one per satellite in ascending rank order, and each satellite's
/// rank paired with its link to the root.
pub fn star(root: Rank, process_count: usize) -> (Vec<MemoryLink>, Vec<(Rank, MemoryLink)>) {
    (0..process_count)
        .filter(|rank| *rank != root)
        .map(|rank| {
            let (root_end, satellite_end) = MemoryLink::pair(root, rank);
            (root_end, (rank, satellite_end))
        })
        .unzip()
}
