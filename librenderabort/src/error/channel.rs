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

//! Contains ChannelError

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::time::Duration;

use crate::topology::Rank;

use super::InternalError;

/// An error which can occur while exchanging messages with a peer process.
///
/// Unlike stray messages, which are absorbed by the coordinators, a channel error always reaches
/// the caller: without the peer's messages the final rendezvous can not make progress.
#[derive(Debug)]
pub enum ChannelError {
    /// The peer's end of the channel has gone away.
    Disconnected { peer: Rank },

    /// A blocking receive did not complete within the configured timeout.
    Timeout { peer: Rank, timeout: Duration },

    /// The underlying transport failed for some other reason.
    Internal(InternalError),
}

impl ChannelError {
    /// Returns the rank of the peer involved, if known.
    pub fn peer(&self) -> Option<Rank> {
        match self {
            ChannelError::Disconnected { peer } => Some(*peer),
            ChannelError::Timeout { peer, .. } => Some(*peer),
            ChannelError::Internal(_) => None,
        }
    }
}

impl Error for ChannelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChannelError::Disconnected { .. } => None,
            ChannelError::Timeout { .. } => None,
            ChannelError::Internal(e) => Some(e),
        }
    }
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        match self {
            ChannelError::Disconnected { peer } => {
                write!(f, "channel to rank {} is disconnected", peer)
            }
            ChannelError::Timeout { peer, timeout } => write!(
                f,
                "no message from rank {} within {}ms",
                peer,
                timeout.as_millis()
            ),
            ChannelError::Internal(e) => write!(f, "{}", e),
        }
    }
}

impl From<InternalError> for ChannelError {
    fn from(err: InternalError) -> Self {
        ChannelError::Internal(err)
    }
}
