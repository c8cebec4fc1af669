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

use crate::error::ChannelError;
use crate::message::RenderMessage;

use super::MessageChannel;

/// At most one outstanding asynchronous receive on a link.
///
/// The slot is either empty or armed. `arm` posts a receive only when the slot is empty, so a
/// holder can never have two receives outstanding on the same link.
#[derive(Debug)]
pub struct PendingReceive<R> {
    inner: Option<R>,
}

impl<R> Default for PendingReceive<R> {
    fn default() -> Self {
        Self { inner: None }
    }
}

impl<R> PendingReceive<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.inner.is_some()
    }

    /// Posts a receive on `channel` unless one is already outstanding.
    pub fn arm<C>(&mut self, channel: &mut C) -> Result<(), ChannelError>
    where
        C: MessageChannel<Receive = R>,
    {
        if self.inner.is_none() {
            self.inner = Some(channel.post_receive()?);
        }
        Ok(())
    }

    /// Tests the outstanding receive without blocking.
    ///
    /// Returns the delivered message, leaving the slot empty, if the receive completed. An empty
    /// slot yields `None`.
    pub fn poll<C>(&mut self, channel: &mut C) -> Result<Option<RenderMessage>, ChannelError>
    where
        C: MessageChannel<Receive = R>,
    {
        let mut receive = match self.inner.take() {
            Some(receive) => receive,
            None => return Ok(None),
        };

        match channel.test_receive(&mut receive) {
            Ok(Some(message)) => Ok(Some(message)),
            Ok(None) => {
                self.inner = Some(receive);
                Ok(None)
            }
            Err(err) => {
                self.inner = Some(receive);
                Err(err)
            }
        }
    }

    /// Cancels the outstanding receive, if any, leaving the slot empty.
    ///
    /// Returns the message which completed the receive before the cancellation could take
    /// effect, if there was one.
    pub fn cancel<C>(&mut self, channel: &mut C) -> Result<Option<RenderMessage>, ChannelError>
    where
        C: MessageChannel<Receive = R>,
    {
        match self.inner.take() {
            Some(receive) => channel.cancel_receive(receive),
            None => Ok(None),
        }
    }
}
