use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use reqwest::Client;
use serde_json::Value as JsonValue;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
struct WebhookJob {
    event_type: String,
    payload: JsonValue,
    attempts: u32,
}

/// Fire-and-forget staff notifications: queued in process, delivered by a
/// background worker with bounded retries.
#[derive(Clone)]
pub struct NotificationService {
    client: Client,
    target_url: Option<String>,
    secret: String,
    queue: Arc<Mutex<VecDeque<WebhookJob>>>,
}

impl NotificationService {
    pub fn new(target_url: Option<String>, secret: String) -> Self {
        Self {
            client: Client::new(),
            target_url,
            secret,
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn enqueue(&self, event_type: &str, payload: JsonValue) {
        if self.target_url.is_none() {
            return;
        }
        self.queue
            .lock()
            .expect("webhook queue mutex poisoned")
            .push_back(WebhookJob {
                event_type: event_type.to_string(),
                payload,
                attempts: 0,
            });
    }

    /// Delivers at most one queued event. Returns whether any work was done.
    pub async fn run_once(&self) -> crate::error::Result<bool> {
        let Some(target_url) = self.target_url.clone() else {
            return Ok(false);
        };
        let job = {
            let mut queue = self.queue.lock().expect("webhook queue mutex poisoned");
            queue.pop_front()
        };
        let Some(mut job) = job else {
            return Ok(false);
        };

        let body = serde_json::json!({
            "event": job.event_type,
            "payload": job.payload,
        });
        let result = self
            .client
            .post(&target_url)
            .header("X-Webhook-Secret", &self.secret)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                tracing::warn!(event = %job.event_type, status = %resp.status(), "Webhook delivery failed");
                self.requeue(&mut job);
            }
            Err(err) => {
                tracing::warn!(event = %job.event_type, error = %err, "Webhook delivery failed");
                self.requeue(&mut job);
            }
        }
        Ok(true)
    }

    fn requeue(&self, job: &mut WebhookJob) {
        job.attempts += 1;
        if job.attempts < MAX_ATTEMPTS {
            self.queue
                .lock()
                .expect("webhook queue mutex poisoned")
                .push_back(job.clone());
        } else {
            tracing::error!(event = %job.event_type, "Dropping webhook after {} attempts", job.attempts);
        }
    }
}
