//! Job records and the rate-limited FIFO queue.
//!
//! The [`JobQueue::drain`] algorithm is shared by the uplink transfer stage
//! and the MEC processing stage: it serves the head job with whatever budget
//! remains, carries partial remainders across steps, and never reorders or
//! skips a partially served head.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use mecsim_common::{DeviceId, Error, JobId, Result};

/// Which remaining-demand field a drain consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandKind {
    /// Uplink communication demand, drained by the transfer stage.
    Communication,
    /// Computation demand, drained by the MEC processing stage.
    Computation,
}

/// A communication/computation job offloaded by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique id within the episode
    pub id: JobId,
    /// Owning device
    pub owner: DeviceId,
    /// Timestep the job was generated
    pub created_at: u64,
    /// Total communication demand in Mb
    pub total_comm_demand: f64,
    /// Communication demand not yet transferred
    pub remaining_comm_demand: f64,
    /// Total computation demand in units
    pub total_comp_demand: f64,
    /// Computation demand not yet processed
    pub remaining_comp_demand: f64,
    /// Step the uplink transfer completed; set exactly once
    pub transferred_at: Option<u64>,
    /// Step the MEC processing completed; set exactly once, never before
    /// `transferred_at`
    pub accomplished_at: Option<u64>,
    /// End-to-end delay threshold in steps
    pub e2e_delay_threshold: f64,
}

impl Job {
    /// Creates a freshly generated job with `remaining = total` demands.
    pub fn new(
        id: JobId,
        owner: DeviceId,
        created_at: u64,
        comm_demand: f64,
        comp_demand: f64,
        e2e_delay_threshold: f64,
    ) -> Result<Self> {
        if comm_demand < 0.0 || comp_demand < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "job demands must be non-negative, got comm={comm_demand}, comp={comp_demand}"
            )));
        }
        Ok(Self {
            id,
            owner,
            created_at,
            total_comm_demand: comm_demand,
            remaining_comm_demand: comm_demand,
            total_comp_demand: comp_demand,
            remaining_comp_demand: comp_demand,
            transferred_at: None,
            accomplished_at: None,
            e2e_delay_threshold,
        })
    }

    /// Remaining demand of the given kind.
    pub fn remaining(&self, kind: DemandKind) -> f64 {
        match kind {
            DemandKind::Communication => self.remaining_comm_demand,
            DemandKind::Computation => self.remaining_comp_demand,
        }
    }

    /// End-to-end delay; only meaningful once accomplished.
    pub fn e2e_delay(&self) -> Option<f64> {
        self.accomplished_at
            .map(|done| (done - self.created_at) as f64)
    }
}

/// Outcome of a [`JobQueue::drain`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DrainOutcome {
    /// Capacity actually consumed across all served jobs
    pub consumed: f64,
    /// Number of jobs fully completed by this drain
    pub completed: usize,
}

/// FIFO queue of jobs with bounded-capacity drain.
///
/// Used for device uplink buffers, per-station transfer queues and
/// per-station accomplished queues. Insertion order equals arrival order and
/// is never changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job at the tail.
    pub fn push(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if no job is queued.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Removes all jobs.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Iterates the queued jobs in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Sum of remaining demand of the given kind over all queued jobs.
    pub fn outstanding(&self, kind: DemandKind) -> f64 {
        self.jobs.iter().map(|job| job.remaining(kind)).sum()
    }

    /// Drains the queue head-first with a bounded capacity budget.
    ///
    /// While budget remains and the queue is non-empty, the head job is
    /// served `min(budget, remaining)`. A head whose remaining demand reaches
    /// exactly zero is stamped via `on_complete` and popped, and the leftover
    /// budget flows to the next job; a partially served head stays and blocks
    /// the queue.
    ///
    /// Computation drains require the head to be fully transferred already;
    /// violating that is a [`Error::PreconditionViolation`].
    pub fn drain(
        &mut self,
        budget: f64,
        kind: DemandKind,
        now: u64,
        mut on_complete: impl FnMut(Job),
    ) -> Result<DrainOutcome> {
        if budget < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "drain budget must be non-negative, got {budget}"
            )));
        }

        let mut outcome = DrainOutcome::default();
        let mut budget = budget;

        while budget > 0.0 {
            let Some(head) = self.jobs.front_mut() else {
                break;
            };
            if kind == DemandKind::Computation && head.transferred_at.is_none() {
                return Err(Error::PreconditionViolation(format!(
                    "{} cannot be processed before it is fully transferred",
                    head.id
                )));
            }

            let remaining = head.remaining(kind);
            let consumed = budget.min(remaining);
            match kind {
                DemandKind::Communication => head.remaining_comm_demand -= consumed,
                DemandKind::Computation => head.remaining_comp_demand -= consumed,
            }
            budget -= consumed;
            outcome.consumed += consumed;

            if head.remaining(kind) == 0.0 {
                match kind {
                    DemandKind::Communication => head.transferred_at = Some(now),
                    DemandKind::Computation => head.accomplished_at = Some(now),
                }
                let job = self.jobs.pop_front().expect("head exists");
                outcome.completed += 1;
                on_complete(job);
            } else {
                // partially served head blocks FIFO order
                break;
            }
        }

        Ok(outcome)
    }
}
