// Copyright 2025 strata developers
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

//! The phased job scheduler.
//!
//! Jobs carry a declared component access list. Phases execute strictly in
//! ascending index order with a full barrier between them. Within a phase
//! the scheduler partitions jobs, in registration order, into conflict-free
//! *batches*: two jobs conflict iff both declare the same component type and
//! at least one declares read-write. Batches run sequentially; jobs within a
//! batch run in parallel on a fixed-size worker pool. A conflicting job is
//! always batched after the last earlier-registered job it conflicts with,
//! so conflicting jobs observe each other in registration order.
//!
//! There is no suspension, cancellation, or timeout: a job runs to
//! completion once dispatched, and a panicking job aborts the frame.

use crate::ecs::access::{access_sets_conflict, ComponentAccess};
use crate::ecs::world::TickContext;
use std::sync::{Arc, Mutex};

/// The callback type executed by the scheduler.
pub type JobFn = Box<dyn FnMut(&TickContext) + Send>;

/// A schedulable unit of work with declared component access.
pub struct Job {
    /// Diagnostic name.
    pub name: String,
    /// The component types this job may touch, with permissions; drives
    /// conflict detection.
    pub accesses: Vec<ComponentAccess>,
    /// The work itself.
    pub run: JobFn,
}

impl Job {
    /// Creates a job from a name, accesses, and a callback.
    pub fn new(
        name: impl Into<String>,
        accesses: Vec<ComponentAccess>,
        run: impl FnMut(&TickContext) + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            accesses,
            run: Box::new(run),
        }
    }
}

/// Handle to a registered regular job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

struct RegularJob {
    id: JobId,
    job: Job,
}

/// One-shot job queues, shared with the tick context so jobs can schedule
/// follow-up work mid-phase. The locks protect only the queues.
#[derive(Default)]
pub(crate) struct OneShotQueues {
    /// Run before phase 0 of the next frame.
    asap: Mutex<Vec<Job>>,
    /// Run after the last phase of the current frame.
    post_frame: Mutex<Vec<Job>>,
}

impl OneShotQueues {
    pub(crate) fn push_asap(&self, job: Job) {
        self.asap.lock().unwrap().push(job);
    }

    pub(crate) fn push_post_frame(&self, job: Job) {
        self.post_frame.lock().unwrap().push(job);
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Number of worker threads; 0 picks the pool's default (one per
    /// available core).
    pub worker_threads: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { worker_threads: 0 }
    }
}

/// Groups registered jobs into ordered phases and runs each phase on the
/// worker pool under access-conflict serialization.
pub struct JobScheduler {
    pool: rayon::ThreadPool,
    /// Jobs per phase, in registration order.
    phases: Vec<Vec<RegularJob>>,
    queues: Arc<OneShotQueues>,
    next_job_id: u64,
}

impl JobScheduler {
    /// Builds the scheduler and its fixed-size worker pool.
    pub fn new(config: SchedulerConfig) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("ecs-worker-{i}"))
            .build()
            .expect("failed to build the scheduler worker pool");
        Self {
            pool,
            phases: Vec::new(),
            queues: Arc::new(OneShotQueues::default()),
            next_job_id: 0,
        }
    }

    /// Registers a job to run every frame in the given phase.
    pub fn schedule_regular_job(&mut self, job: Job, phase: u32) -> JobId {
        let phase = phase as usize;
        if phase >= self.phases.len() {
            self.phases.resize_with(phase + 1, Vec::new);
        }
        let id = JobId(self.next_job_id);
        self.next_job_id += 1;
        log::debug!("scheduled regular job '{}' in phase {phase}", job.name);
        self.phases[phase].push(RegularJob { id, job });
        id
    }

    /// Removes a regular job. Returns `true` if the id was registered.
    pub fn deschedule_regular_job(&mut self, id: JobId) -> bool {
        for phase in &mut self.phases {
            if let Some(pos) = phase.iter().position(|j| j.id == id) {
                let removed = phase.remove(pos);
                log::debug!("descheduled regular job '{}'", removed.job.name);
                return true;
            }
        }
        false
    }

    /// Queues a one-shot job to run before phase 0 of the next frame.
    pub fn schedule_job_asap(&self, job: Job) {
        self.queues.push_asap(job);
    }

    /// Queues a one-shot job to run after the last phase of the current
    /// frame (or the next frame if no frame is running).
    pub fn schedule_job_post_frame(&self, job: Job) {
        self.queues.push_post_frame(job);
    }

    /// Shared handle to the one-shot queues, for the tick context.
    pub(crate) fn queues(&self) -> Arc<OneShotQueues> {
        self.queues.clone()
    }

    /// Number of phases with at least one registered job slot.
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Runs one frame: pending ASAP jobs, every phase in index order, then
    /// pending post-frame jobs. Returns only when all dispatched jobs have.
    pub(crate) fn run_frame(&mut self, ctx: &TickContext<'_>) {
        let mut asap = std::mem::take(&mut *self.queues.asap.lock().unwrap());
        if !asap.is_empty() {
            Self::run_job_set(&self.pool, &mut asap, ctx);
        }

        for phase in &mut self.phases {
            let mut jobs: Vec<&mut Job> = phase.iter_mut().map(|j| &mut j.job).collect();
            Self::run_batched(&self.pool, &mut jobs, ctx);
        }

        let mut post = std::mem::take(&mut *self.queues.post_frame.lock().unwrap());
        if !post.is_empty() {
            Self::run_job_set(&self.pool, &mut post, ctx);
        }
    }

    fn run_job_set(pool: &rayon::ThreadPool, jobs: &mut [Job], ctx: &TickContext<'_>) {
        let mut refs: Vec<&mut Job> = jobs.iter_mut().collect();
        Self::run_batched(pool, &mut refs, ctx);
    }

    /// Executes one ordered job set under conflict serialization.
    fn run_batched(pool: &rayon::ThreadPool, jobs: &mut Vec<&mut Job>, ctx: &TickContext<'_>) {
        if jobs.is_empty() {
            return;
        }

        let access_sets: Vec<&[ComponentAccess]> =
            jobs.iter().map(|j| j.accesses.as_slice()).collect();
        let batches = conflict_batches(&access_sets);

        let mut slots: Vec<Option<&mut Job>> = jobs.drain(..).map(Some).collect();
        for batch in batches {
            let mut current: Vec<&mut Job> = batch
                .iter()
                .map(|&i| slots[i].take().expect("each job runs in exactly one batch"))
                .collect();

            if current.len() == 1 {
                // A lone job (or a serialized conflicting job) runs on the
                // calling thread.
                let job = current.pop().unwrap();
                (job.run)(ctx);
            } else {
                pool.scope(|scope| {
                    for job in current {
                        scope.spawn(move |_| (job.run)(ctx));
                    }
                });
            }
        }
    }
}

/// Greedy partition of one ordered job set into conflict-free batches.
///
/// Each job is placed in the first batch after every earlier-registered job
/// it conflicts with, so conflicting pairs always run in registration order
/// while independent jobs share a batch.
fn conflict_batches(access_sets: &[&[ComponentAccess]]) -> Vec<Vec<usize>> {
    let mut batches: Vec<Vec<usize>> = Vec::new();
    for (job_idx, accesses) in access_sets.iter().enumerate() {
        let mut first_allowed = 0;
        for (batch_idx, batch) in batches.iter().enumerate() {
            let conflicts = batch
                .iter()
                .any(|&other| access_sets_conflict(accesses, access_sets[other]));
            if conflicts {
                first_allowed = batch_idx + 1;
            }
        }
        if first_allowed < batches.len() {
            batches[first_allowed].push(job_idx);
        } else {
            batches.push(vec![job_idx]);
        }
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::access::Permission;
    use bincode::{Decode, Encode};

    #[derive(Encode, Decode)]
    struct A;
    impl crate::ecs::component::Component for A {}
    #[derive(Encode, Decode)]
    struct B;
    impl crate::ecs::component::Component for B {}

    fn acc(sets: &[Vec<ComponentAccess>]) -> Vec<Vec<usize>> {
        let refs: Vec<&[ComponentAccess]> = sets.iter().map(|s| s.as_slice()).collect();
        conflict_batches(&refs)
    }

    #[test]
    fn readers_share_a_batch() {
        let batches = acc(&[
            vec![ComponentAccess::of::<A>(Permission::R)],
            vec![ComponentAccess::of::<A>(Permission::R)],
        ]);
        assert_eq!(batches, vec![vec![0, 1]], "R/R never conflicts");
    }

    #[test]
    fn writers_are_serialized_in_order() {
        let batches = acc(&[
            vec![ComponentAccess::of::<A>(Permission::RW)],
            vec![ComponentAccess::of::<A>(Permission::RW)],
            vec![ComponentAccess::of::<B>(Permission::RW)],
        ]);
        assert_eq!(
            batches,
            vec![vec![0, 2], vec![1]],
            "conflicting writers split, independent writer joins the first batch"
        );
    }

    #[test]
    fn late_job_never_runs_before_an_earlier_conflicting_job() {
        // 0 writes A; 1 writes B; 2 reads B. 2 conflicts with 1 only and
        // must land in a batch after 1, not beside 0.
        let batches = acc(&[
            vec![ComponentAccess::of::<A>(Permission::RW)],
            vec![ComponentAccess::of::<B>(Permission::RW)],
            vec![ComponentAccess::of::<B>(Permission::R)],
        ]);
        assert_eq!(batches, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn nda_never_conflicts() {
        let batches = acc(&[
            vec![ComponentAccess::of::<A>(Permission::RW)],
            vec![ComponentAccess::of::<A>(Permission::NDA)],
        ]);
        assert_eq!(batches, vec![vec![0, 1]]);
    }
}
