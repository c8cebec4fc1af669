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

//! Contains CoordinatorError

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FormatResult};

use crate::message::Verdict;

use super::ChannelError;
use super::InvalidStateError;
use super::ProtocolViolationError;

/// An error which can occur while a coordinator is polling or running the final rendezvous.
#[derive(Debug)]
pub enum CoordinatorError {
    /// The coordinator was used out of order, e.g. a second final rendezvous in one cycle.
    InvalidState(InvalidStateError),

    /// A peer could not be reached; the current cycle has been abandoned.
    Channel(ChannelError),

    /// A peer sent a message that is illegal in the current phase.
    ProtocolViolation(ProtocolViolationError),
}

impl CoordinatorError {
    /// The verdict the caller must apply locally for the failed cycle, if one is forced.
    ///
    /// Protocol violations always force `AbortComposite`; other errors leave the cycle without
    /// a verdict.
    pub fn forced_verdict(&self) -> Option<Verdict> {
        match self {
            CoordinatorError::ProtocolViolation(e) => Some(e.forced_verdict()),
            CoordinatorError::InvalidState(_) | CoordinatorError::Channel(_) => None,
        }
    }
}

impl Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CoordinatorError::InvalidState(e) => Some(e),
            CoordinatorError::Channel(e) => Some(e),
            CoordinatorError::ProtocolViolation(e) => Some(e),
        }
    }
}

impl Display for CoordinatorError {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        match self {
            CoordinatorError::InvalidState(e) => write!(f, "{}", e),
            CoordinatorError::Channel(e) => write!(f, "{}", e),
            CoordinatorError::ProtocolViolation(e) => write!(f, "{}", e),
        }
    }
}

impl From<InvalidStateError> for CoordinatorError {
    fn from(err: InvalidStateError) -> Self {
        CoordinatorError::InvalidState(err)
    }
}

impl From<ChannelError> for CoordinatorError {
    fn from(err: ChannelError) -> Self {
        CoordinatorError::Channel(err)
    }
}

impl From<ProtocolViolationError> for CoordinatorError {
    fn from(err: ProtocolViolationError) -> Self {
        CoordinatorError::ProtocolViolation(err)
    }
}
