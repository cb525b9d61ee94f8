//! NATS publisher for domain events.
//!
//! Publishing is fire-and-forget: a missing or failing broker never fails
//! the request that produced the event.

use crate::domain::events::DomainEvent;

#[derive(Clone, Debug, Default)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
}

impl EventPublisher {
    /// Connects when a URL is given. Connection failures degrade to a disabled publisher.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else {
            tracing::info!("NATS_URL not set; domain events disabled");
            return Self::disabled();
        };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(url, "connected to nats");
                Self { client: Some(client) }
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "nats unavailable; domain events disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self { Self { client: None } }

    pub fn is_enabled(&self) -> bool { self.client.is_some() }

    pub async fn publish(&self, event: impl Into<DomainEvent>) {
        let Some(client) = &self.client else { return };
        let event = event.into();
        let subject = event.subject();
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(subject, error = %e, "failed to encode event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
            tracing::warn!(subject, error = %e, "failed to publish event");
        }
    }
}
