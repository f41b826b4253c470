use crate::server::EventPublisher;
use tokio::sync::broadcast;

/// A published record as seen by in-process subscribers.
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub topic: String,
    pub key: Vec<u8>,
    pub payload: Vec<u8>,
}

/// In-process publisher over a tokio broadcast channel. Lagging or absent
/// subscribers never fail a publish; delivery is best effort.
pub struct BroadcastPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }
}

#[async_trait::async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()> {
        // send only errors when nobody subscribes, which is fine.
        let _ = self.sender.send(PublishedEvent {
            topic: topic.to_string(),
            key: key.to_vec(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_published_events() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx = publisher.subscribe();

        publisher
            .publish("auth.session", b"subject", b"{}")
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "auth.session");
        assert_eq!(event.key, b"subject");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let publisher = BroadcastPublisher::new(8);
        assert!(publisher.publish("auth.session", b"k", b"{}").await.is_ok());
    }
}
