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

//! Contains ProtocolViolationError

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FormatResult};

use crate::coordinator::RenderCycleState;
use crate::message::{RenderMessage, Verdict};
use crate::topology::Rank;

/// A peer sent a message which is never legal in the phase it arrived in.
///
/// A violation is fatal to the current render cycle on the process which observed it: that
/// process treats the cycle as `AbortComposite` regardless of what the root decides.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolViolationError {
    peer: Rank,
    message: RenderMessage,
    state: RenderCycleState,
}

impl ProtocolViolationError {
    pub fn new(peer: Rank, message: RenderMessage, state: RenderCycleState) -> Self {
        Self {
            peer,
            message,
            state,
        }
    }

    /// The rank which sent the offending message.
    pub fn peer(&self) -> Rank {
        self.peer
    }

    pub fn message(&self) -> RenderMessage {
        self.message
    }

    /// The cycle state of the receiving coordinator when the message arrived.
    pub fn state(&self) -> RenderCycleState {
        self.state
    }

    pub fn forced_verdict(&self) -> Verdict {
        Verdict::AbortComposite
    }
}

impl Error for ProtocolViolationError {}

impl Display for ProtocolViolationError {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        write!(
            f,
            "protocol violation: {:?} from rank {} while {:?}",
            self.message, self.peer, self.state
        )
    }
}
