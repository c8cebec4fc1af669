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

//! Defines the point-to-point communication abstraction used by the coordinators.
//!
//! A link[^note] connects this process to exactly one peer. All protocol messages between the
//! pair travel over that single link and are delivered in the order they were sent. A link
//! supports blocking sends, fire-and-forget sends, blocking receives, and asynchronous receives
//! which are posted, tested, and possibly cancelled.
//!
//! [^note]: For a full explanation of links, see Cachin, Guerraoui, and Rodrigues, **Reliable and
//! Secure Distributed Programming**, 2nd ed., 2.4.

#[cfg(feature = "memory-link")]
pub mod memory;
mod pending;

pub use pending::PendingReceive;

use crate::error::ChannelError;
use crate::message::RenderMessage;
use crate::topology::Rank;

/// One end of a link to a single peer process.
pub trait MessageChannel {
    /// A handle to an asynchronous receive which has been posted but has not completed.
    type Receive;

    /// The rank of the process on the other end of this link.
    fn peer(&self) -> Rank;

    /// Sends a message, returning once the transport has taken responsibility for it.
    ///
    /// # Errors
    ///
    /// A [`ChannelError`] is returned if the peer can not be reached.
    fn send(&self, message: RenderMessage) -> Result<(), ChannelError>;

    /// Sends a message without waiting for the transport to accept it.
    ///
    /// # Errors
    ///
    /// A [`ChannelError`] is returned if the peer is known to be unreachable.
    fn send_nowait(&self, message: RenderMessage) -> Result<(), ChannelError>;

    /// Blocks until the next message from the peer arrives.
    ///
    /// # Errors
    ///
    /// A [`ChannelError`] is returned if the peer goes away, or if the implementation bounds the
    /// wait and no message arrives in time.
    fn receive(&mut self) -> Result<RenderMessage, ChannelError>;

    /// Posts an asynchronous receive for the next message from the peer.
    fn post_receive(&mut self) -> Result<Self::Receive, ChannelError>;

    /// Checks, without blocking, whether a posted receive has completed.
    fn test_receive(
        &mut self,
        receive: &mut Self::Receive,
    ) -> Result<Option<RenderMessage>, ChannelError>;

    /// Cancels a posted receive.
    ///
    /// If a message was matched to the receive before the cancellation took effect, that message
    /// is returned and has been consumed; otherwise no message is consumed.
    fn cancel_receive(
        &mut self,
        receive: Self::Receive,
    ) -> Result<Option<RenderMessage>, ChannelError>;
}
