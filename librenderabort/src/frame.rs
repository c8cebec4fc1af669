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

//! The local collaborators a coordinator drives: the abort oracle and the frame being produced.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Answers whether the frame currently being produced should be abandoned.
pub trait AbortSignalSource {
    /// Returns true if the user has asked for the in-flight frame to be aborted.
    fn should_abort(&mut self) -> bool;

    /// Returns true while aborting is not allowed at all, for example while printing.
    fn is_non_abortable(&self) -> bool {
        false
    }
}

impl<F> AbortSignalSource for F
where
    F: FnMut() -> bool,
{
    fn should_abort(&mut self) -> bool {
        self()
    }
}

/// The local producer of the in-progress frame.
pub trait FrameSink {
    /// Requests that production of the current frame stops immediately.
    ///
    /// Implementations must be idempotent: a frame may be stopped once because the local oracle
    /// asked for it and again when a delayed `AbortRender` arrives.
    fn stop(&mut self);
}

/// A cloneable stop request shared between a coordinator and the render loop it interrupts.
///
/// Every clone observes the same state. Stopping is idempotent and the flag stays set until
/// [`StopFlag::reset`] is called, normally when the next frame begins.
#[derive(Clone, Debug, Default)]
pub struct StopFlag {
    stopped: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// The number of stop requests made since the last reset, including redundant ones.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.stopped.store(false, Ordering::SeqCst);
        self.requests.store(0, Ordering::SeqCst);
    }
}

impl FrameSink for StopFlag {
    fn stop(&mut self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.stopped.swap(true, Ordering::SeqCst) {
            debug!("Stopping frame production");
        }
    }
}
