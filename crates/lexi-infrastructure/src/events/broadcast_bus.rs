use async_trait::async_trait;
use dashmap::DashMap;
use lexi_domain::error::Result;
use lexi_domain::ports::services::{ProgressEvent, ProgressPublisher};
use lexi_domain::value_objects::JobId;
use tokio::sync::broadcast;

const ROOM_BUFFER_SIZE: usize = 256;

/// In-process Progress Bus: one broadcast channel per `job:{job_id}` room,
/// created lazily on first publish or subscribe. Rooms are never removed
/// (a terminal job's last event should still reach a client that
/// subscribed late); the server evicts idle rooms on its own schedule if
/// it needs to.
pub struct BroadcastProgressBus {
    rooms: DashMap<JobId, broadcast::Sender<ProgressEvent>>,
}

impl BroadcastProgressBus {
    /// Build an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    fn room(&self, job_id: JobId) -> broadcast::Sender<ProgressEvent> {
        self.rooms
            .entry(job_id)
            .or_insert_with(|| broadcast::channel(ROOM_BUFFER_SIZE).0)
            .clone()
    }

    /// Subscribe to `job:{job_id}`'s room, for the WebSocket handler.
    #[must_use]
    pub fn subscribe(&self, job_id: JobId) -> broadcast::Receiver<ProgressEvent> {
        self.room(job_id).subscribe()
    }
}

impl Default for BroadcastProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressPublisher for BroadcastProgressBus {
    async fn publish(&self, job_id: JobId, event: ProgressEvent) -> Result<()> {
        let sender = self.room(job_id);
        match sender.send(event) {
            Ok(count) => tracing::debug!(%job_id, subscribers = count, "published progress event"),
            Err(_) => tracing::debug!(%job_id, "published progress event, no subscribers"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(job_id: JobId) -> ProgressEvent {
        ProgressEvent {
            job_id,
            state: "processing".to_owned(),
            progress_percent: 50,
            current_step: "working".to_owned(),
            processed_chunks: Some(1),
            total_chunks: Some(2),
            job_snapshot: None,
        }
    }

    #[tokio::test]
    async fn publish_reaches_a_subscriber_on_the_same_room() {
        let bus = BroadcastProgressBus::new();
        let job_id = JobId::new();
        let mut rx = bus.subscribe(job_id);
        bus.publish(job_id, sample_event(job_id)).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.job_id, job_id);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_error() {
        let bus = BroadcastProgressBus::new();
        let job_id = JobId::new();
        assert!(bus.publish(job_id, sample_event(job_id)).await.is_ok());
    }
}
