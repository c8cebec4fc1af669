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

//! Messages exchanged between the root and its satellites.
//!
//! Every message travels over a single logical channel per peer pair and is identified by its
//! variant alone. Each role may only legally receive a subset of the messages; those subsets are
//! [`RootMessage`] and [`SatelliteMessage`].

use std::convert::TryFrom;

use crate::error::InvalidStateError;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RenderMessage {
    /// Satellite to root: is the root asking this satellite to abort?
    CheckAbort,
    /// Satellite to root: this satellite has stopped producing the frame.
    Finished,
    /// Root to satellite: stop producing the frame now.
    AbortRender,
    /// Root to satellite: the root is blocked on this satellite; ping it with `CheckAbort`.
    RootWaiting,
    /// Root to satellite: skip compositing this cycle.
    AbortComposite,
    /// Root to satellite: run compositing this cycle.
    Composite,
}

/// The outcome of a final rendezvous.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Verdict {
    Composite,
    AbortComposite,
}

impl Verdict {
    pub fn from_aborted(aborted: bool) -> Self {
        if aborted {
            Verdict::AbortComposite
        } else {
            Verdict::Composite
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Verdict::Composite)
    }
}

/// A message which is delivered to the root.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RootMessage {
    CheckAbort,
    Finished,
}

/// A message which is delivered to a satellite.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SatelliteMessage {
    AbortRender,
    RootWaiting,
    Verdict(Verdict),
}

impl From<Verdict> for RenderMessage {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Composite => RenderMessage::Composite,
            Verdict::AbortComposite => RenderMessage::AbortComposite,
        }
    }
}

impl From<RootMessage> for RenderMessage {
    fn from(message: RootMessage) -> Self {
        match message {
            RootMessage::CheckAbort => RenderMessage::CheckAbort,
            RootMessage::Finished => RenderMessage::Finished,
        }
    }
}

impl From<SatelliteMessage> for RenderMessage {
    fn from(message: SatelliteMessage) -> Self {
        match message {
            SatelliteMessage::AbortRender => RenderMessage::AbortRender,
            SatelliteMessage::RootWaiting => RenderMessage::RootWaiting,
            SatelliteMessage::Verdict(verdict) => verdict.into(),
        }
    }
}

impl TryFrom<RenderMessage> for RootMessage {
    type Error = InvalidStateError;

    fn try_from(message: RenderMessage) -> Result<Self, Self::Error> {
        match message {
            RenderMessage::CheckAbort => Ok(RootMessage::CheckAbort),
            RenderMessage::Finished => Ok(RootMessage::Finished),
            RenderMessage::AbortRender
            | RenderMessage::RootWaiting
            | RenderMessage::AbortComposite
            | RenderMessage::Composite => Err(InvalidStateError::with_message(format!(
                "{:?} message cannot be handled by the root",
                message
            ))),
        }
    }
}

impl TryFrom<RenderMessage> for SatelliteMessage {
    type Error = InvalidStateError;

    fn try_from(message: RenderMessage) -> Result<Self, Self::Error> {
        match message {
            RenderMessage::AbortRender => Ok(SatelliteMessage::AbortRender),
            RenderMessage::RootWaiting => Ok(SatelliteMessage::RootWaiting),
            RenderMessage::AbortComposite => {
                Ok(SatelliteMessage::Verdict(Verdict::AbortComposite))
            }
            RenderMessage::Composite => Ok(SatelliteMessage::Verdict(Verdict::Composite)),
            RenderMessage::CheckAbort | RenderMessage::Finished => {
                Err(InvalidStateError::with_message(format!(
                    "{:?} message cannot be handled by a satellite",
                    message
                )))
            }
        }
    }
}
