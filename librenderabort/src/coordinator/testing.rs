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

//! Scripted collaborators shared by the coordinator tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{ChannelError, InternalError};
use crate::frame::AbortSignalSource;
use crate::links::MessageChannel;
use crate::message::RenderMessage;
use crate::topology::Rank;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkEvent {
    Sent(Rank, RenderMessage),
    Received(Rank, RenderMessage),
}

pub type EventLog = Rc<RefCell<Vec<LinkEvent>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// A link whose inbound messages are fixed up front and whose traffic is recorded in a log
/// shared with other links, so the relative order of events across peers can be checked.
///
/// A receive on an exhausted script fails as if the peer had disconnected.
pub struct ScriptedLink {
    peer: Rank,
    inbound: VecDeque<RenderMessage>,
    log: EventLog,
    refused: Vec<RenderMessage>,
    posts_allowed: Option<usize>,
}

impl ScriptedLink {
    pub fn new(peer: Rank, inbound: Vec<RenderMessage>, log: &EventLog) -> Self {
        ScriptedLink {
            peer,
            inbound: inbound.into(),
            log: log.clone(),
            refused: Vec::new(),
            posts_allowed: None,
        }
    }

    /// Sending any of `messages` fails as if the peer had disconnected.
    pub fn refusing(mut self, messages: Vec<RenderMessage>) -> Self {
        self.refused = messages;
        self
    }

    /// Only the first `count` receives may be posted; later posts fail.
    pub fn posting_at_most(mut self, count: usize) -> Self {
        self.posts_allowed = Some(count);
        self
    }

    fn next(&mut self) -> Option<RenderMessage> {
        let message = self.inbound.pop_front()?;
        self.log
            .borrow_mut()
            .push(LinkEvent::Received(self.peer, message));
        Some(message)
    }
}

impl MessageChannel for ScriptedLink {
    type Receive = ();

    fn peer(&self) -> Rank {
        self.peer
    }

    fn send(&self, message: RenderMessage) -> Result<(), ChannelError> {
        if self.refused.contains(&message) {
            return Err(ChannelError::Disconnected { peer: self.peer });
        }
        self.log.borrow_mut().push(LinkEvent::Sent(self.peer, message));
        Ok(())
    }

    fn send_nowait(&self, message: RenderMessage) -> Result<(), ChannelError> {
        self.send(message)
    }

    fn receive(&mut self) -> Result<RenderMessage, ChannelError> {
        self.next()
            .ok_or(ChannelError::Disconnected { peer: self.peer })
    }

    fn post_receive(&mut self) -> Result<Self::Receive, ChannelError> {
        match self.posts_allowed {
            Some(0) => Err(ChannelError::Internal(InternalError::with_message(format!(
                "unable to post a receive for rank {}",
                self.peer
            )))),
            Some(ref mut remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn test_receive(
        &mut self,
        _receive: &mut Self::Receive,
    ) -> Result<Option<RenderMessage>, ChannelError> {
        Ok(self.next())
    }

    fn cancel_receive(
        &mut self,
        _receive: Self::Receive,
    ) -> Result<Option<RenderMessage>, ChannelError> {
        Ok(None)
    }
}

/// Returns every message sent, in order, with the rank it was sent to.
pub fn sent(log: &EventLog) -> Vec<(Rank, RenderMessage)> {
    log.borrow()
        .iter()
        .filter_map(|event| match event {
            LinkEvent::Sent(rank, message) => Some((*rank, *message)),
            LinkEvent::Received(_, _) => None,
        })
        .collect()
}

/// An abort oracle which answers from a script, then repeats a fixed answer.
pub struct ScriptedAbort {
    answers: VecDeque<bool>,
    then: bool,
    non_abortable: bool,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAbort {
    pub fn new(answers: Vec<bool>, then: bool) -> Self {
        ScriptedAbort {
            answers: answers.into(),
            then,
            non_abortable: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn never() -> Self {
        Self::new(vec![], false)
    }

    pub fn non_abortable(mut self) -> Self {
        self.non_abortable = true;
        self
    }

    /// A counter of `should_abort` calls which stays readable after the oracle is moved.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl AbortSignalSource for ScriptedAbort {
    fn should_abort(&mut self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers.pop_front().unwrap_or(self.then)
    }

    fn is_non_abortable(&self) -> bool {
        self.non_abortable
    }
}
