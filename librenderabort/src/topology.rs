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

//! Static knowledge about the processes taking part in a cluster render.

use crate::error::InvalidStateError;

/// The identity of a process within the cluster.
pub type Rank = usize;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessRole {
    Root,
    Satellite,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterTopology {
    this_rank: Rank,
    root: Rank,
    process_count: usize,
}

impl ClusterTopology {
    /// Creates a topology where rank 0 is the root.
    pub fn new(this_rank: Rank, process_count: usize) -> Result<Self, InvalidStateError> {
        Self::with_root(this_rank, 0, process_count)
    }

    pub fn with_root(
        this_rank: Rank,
        root: Rank,
        process_count: usize,
    ) -> Result<Self, InvalidStateError> {
        if process_count == 0 {
            return Err(InvalidStateError::with_message(
                "a cluster must contain at least one process".into(),
            ));
        }
        if this_rank >= process_count || root >= process_count {
            return Err(InvalidStateError::with_message(format!(
                "ranks {} and {} must both be less than the process count {}",
                this_rank, root, process_count
            )));
        }

        Ok(Self {
            this_rank,
            root,
            process_count,
        })
    }

    pub fn role(&self) -> ProcessRole {
        if self.this_rank == self.root {
            ProcessRole::Root
        } else {
            ProcessRole::Satellite
        }
    }

    pub fn this_rank(&self) -> Rank {
        self.this_rank
    }

    pub fn root(&self) -> Rank {
        self.root
    }

    pub fn process_count(&self) -> usize {
        self.process_count
    }

    pub fn is_single_process(&self) -> bool {
        self.process_count == 1
    }

    /// The ranks this process exchanges messages with, in ascending order.
    ///
    /// The root talks to every satellite; a satellite only talks to the root.
    pub fn peer_ranks(&self) -> Vec<Rank> {
        match self.role() {
            ProcessRole::Root => (0..self.process_count)
                .filter(|rank| *rank != self.root)
                .collect(),
            ProcessRole::Satellite => vec![self.root],
        }
    }
}
