use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::mailer::NewsletterMailer;
use crate::store::SubscriberStore;

/// One scheduled or immediate newsletter send targeting all subscribers.
///
/// Jobs live in process memory only: a restart silently drops every pending
/// job. Each job carries a unique id and is removed by identity once it
/// completes, so two jobs sharing a send time are tracked independently (the
/// original removed by send-time equality, which collapsed duplicates).
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub id: Uuid,
    pub send_time: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
}

impl ScheduledJob {
    fn new(send_time: DateTime<Utc>) -> ScheduledJob {
        ScheduledJob {
            id: Uuid::new_v4(),
            send_time,
            scheduled_at: Utc::now(),
        }
    }
}

/// The set of jobs that have been accepted but not yet dispatched.
///
/// Mutated concurrently by request handlers (add) and by the background tasks
/// (remove), so every access goes through the mutex. The lock is never held
/// across an await point.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<Vec<ScheduledJob>>,
}

impl JobRegistry {
    pub fn new() -> JobRegistry {
        JobRegistry::default()
    }

    fn add(&self, job: ScheduledJob) {
        self.jobs.lock().unwrap().push(job);
    }

    fn remove(&self, id: Uuid) {
        self.jobs.lock().unwrap().retain(|job| job.id != id);
    }

    /// Snapshot of the pending jobs, oldest send time first.
    pub fn pending(&self) -> Vec<ScheduledJob> {
        let mut jobs = self.jobs.lock().unwrap().clone();
        jobs.sort_by_key(|job| job.send_time);
        jobs
    }
}

/// Per-job tally of the subscriber fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub failed: usize,
}

/// Handle to a launched job. Dropping it detaches the task; holding it allows
/// awaiting the outcome or aborting the dispatch.
pub struct JobHandle {
    pub id: Uuid,
    pub task: JoinHandle<DispatchOutcome>,
}

/// Accepts send times, tracks pending jobs and fans the newsletter out to
/// every subscriber in a background task.
#[derive(Clone)]
pub struct Scheduler {
    registry: Arc<JobRegistry>,
    store: Arc<dyn SubscriberStore>,
    mailer: Arc<dyn NewsletterMailer>,
}

impl Scheduler {
    pub fn new(
        registry: Arc<JobRegistry>,
        store: Arc<dyn SubscriberStore>,
        mailer: Arc<dyn NewsletterMailer>,
    ) -> Scheduler {
        Scheduler {
            registry,
            store,
            mailer,
        }
    }

    /// Registers a job and launches its dispatch task without blocking.
    ///
    /// The job is visible to status queries as soon as this returns. A send
    /// time at or before now is legal and dispatches immediately; rejecting
    /// past-dated times for the user-facing schedule action is the request
    /// surface's responsibility.
    pub fn schedule(&self, send_time: DateTime<Utc>) -> JobHandle {
        let job = ScheduledJob::new(send_time);
        let id = job.id;

        self.registry.add(job);

        let scheduler = self.clone();
        let task = tokio::spawn(async move { scheduler.run_job(id, send_time).await });

        tracing::info!("Newsletter scheduled for {} - job {} launched", send_time, id);

        JobHandle { id, task }
    }

    #[tracing::instrument(
        name = "Dispatching a scheduled newsletter",
        skip(self),
        fields(job_id = %id)
    )]
    async fn run_job(self, id: Uuid, send_time: DateTime<Utc>) -> DispatchOutcome {
        // Negative durations fail the conversion, so past send times skip the
        // wait entirely. Each job sleeps on its own task: concurrent jobs do
        // not serialize on each other.
        if let Ok(wait) = (send_time - Utc::now()).to_std() {
            tracing::info!("Waiting {}s until {}", wait.as_secs(), send_time);
            tokio::time::sleep(wait).await;
        }

        // Fetched once per job: the recipient list is a snapshot taken at
        // dispatch time. An unreachable store yields the empty list (logged
        // at the store layer) and the job completes with a 0/0 outcome.
        let recipients = self.store.subscriber_emails().await;

        tracing::info!("Sending newsletter to {} subscribers", recipients.len());

        let mut outcome = DispatchOutcome::default();

        for recipient in &recipients {
            match self.mailer.send(recipient).await {
                Ok(()) => {
                    tracing::info!("Newsletter sent to {}", recipient);
                    outcome.sent += 1;
                }
                Err(err) => {
                    // One failure belongs to one recipient; the rest of the
                    // fan-out continues.
                    tracing::error!("Failed to send to {}: {:?}", recipient, err);
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            "Newsletter dispatch completed. Success: {}, Failed: {}",
            outcome.sent,
            outcome.failed
        );

        self.registry.remove(id);

        outcome
    }
}
