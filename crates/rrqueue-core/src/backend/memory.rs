//! In-process queue backend (`memory` driver).

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rrqueue_types::Result;
use std::collections::VecDeque;

use super::{Backend, Delay, Job, PushOptions};

const RAW_JOB_NAME: &str = "raw";

/// FIFO queues held in memory, one per queue name.
///
/// Delayed jobs stay in their queue and are skipped by `pop` until they
/// become available.
pub struct MemoryQueue {
    name: String,
    default_queue: String,
    queues: DashMap<String, VecDeque<Job>>,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>, default_queue: impl Into<String>) -> Self {
        Self { name: name.into(), default_queue: default_queue.into(), queues: DashMap::new() }
    }

    fn queue_or_default<'a>(&'a self, queue: Option<&'a str>) -> &'a str {
        queue.filter(|q| !q.is_empty()).unwrap_or(&self.default_queue)
    }

    fn enqueue(
        &self,
        name: &str,
        payload: serde_json::Value,
        queue: &str,
        delay: Option<Delay>,
    ) -> serde_json::Value {
        let now = Utc::now();
        let job = Job {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            payload,
            queue: queue.to_string(),
            attempts: 0,
            available_at: delay.map_or(now, |d| d.available_at(now)),
            created_at: now,
        };
        let id = job.id.clone();

        self.queues.entry(queue.to_string()).or_default().push_back(job);
        tracing::debug!(connection = %self.name, queue = %queue, job_id = %id, "Job stored");

        serde_json::Value::String(id)
    }

    /// Snapshot of the jobs currently stored on `queue`, oldest first.
    pub fn jobs(&self, queue: &str) -> Vec<Job> {
        self.queues.get(queue).map(|q| q.iter().cloned().collect()).unwrap_or_default()
    }
}

#[async_trait]
impl Backend for MemoryQueue {
    fn connection_name(&self) -> &str {
        &self.name
    }

    async fn size(&self, queue: Option<&str>) -> Result<u64> {
        let queue = self.queue_or_default(queue);
        Ok(self.queues.get(queue).map_or(0, |q| q.len() as u64))
    }

    async fn push(
        &self,
        job: &str,
        payload: &serde_json::Value,
        queue: Option<&str>,
    ) -> Result<serde_json::Value> {
        let queue = self.queue_or_default(queue);
        Ok(self.enqueue(job, payload.clone(), queue, None))
    }

    async fn push_raw(
        &self,
        payload: &str,
        queue: Option<&str>,
        options: &PushOptions,
    ) -> Result<serde_json::Value> {
        let queue = self.queue_or_default(queue);
        let name = options.get("job").and_then(|v| v.as_str()).unwrap_or(RAW_JOB_NAME);
        Ok(self.enqueue(name, serde_json::Value::String(payload.to_string()), queue, None))
    }

    async fn later(
        &self,
        delay: Delay,
        job: &str,
        payload: &serde_json::Value,
        queue: Option<&str>,
    ) -> Result<serde_json::Value> {
        let queue = self.queue_or_default(queue);
        Ok(self.enqueue(job, payload.clone(), queue, Some(delay)))
    }

    async fn pop(&self, queue: Option<&str>) -> Result<Option<Job>> {
        let queue = self.queue_or_default(queue);
        let Some(mut jobs) = self.queues.get_mut(queue) else {
            return Ok(None);
        };

        let now = Utc::now();
        let Some(position) = jobs.iter().position(|job| job.available_at <= now) else {
            return Ok(None);
        };

        Ok(jobs.remove(position).map(|mut job| {
            job.attempts += 1;
            job
        }))
    }
}
