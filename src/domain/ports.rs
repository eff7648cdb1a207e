use std::time::Duration;

use tokio::sync::mpsc;

use super::catalog::{Machine, Product};
use super::dtmf::DtmfTone;
use super::errors::{DomainError, PlaybackError};
use super::order::{Order, OrderStatus};

pub trait OrderRepository: Send + Sync + 'static {
    fn create(&self, order: &Order) -> Result<(), DomainError>;
    fn find_by_id(&self, id: &str) -> Result<Option<Order>, DomainError>;
    fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>, DomainError>;
    /// Persist `order` only if the stored status still equals `expected`.
    fn save_transition(&self, order: &Order, expected: OrderStatus) -> Result<(), DomainError>;
    /// Stream snapshots of a user's orders as they change.
    fn subscribe(&self, user_id: &str) -> Result<OrderSubscription, DomainError>;
}

pub trait CatalogRepository: Send + Sync + 'static {
    fn product(&self, id: i64) -> Result<Option<Product>, DomainError>;
    fn products(&self) -> Result<Vec<Product>, DomainError>;
    fn machine(&self, id: &str) -> Result<Option<Machine>, DomainError>;
    fn machines(&self) -> Result<Vec<Machine>, DomainError>;
}

/// An audio device able to emit DTMF tones.
pub trait ToneOutput: Send + Sync + 'static {
    /// Start `tone`; the device stops it on its own after `duration`.
    fn start_tone(&self, tone: DtmfTone, duration: Duration) -> Result<(), PlaybackError>;
    /// Silence the device immediately.
    fn stop(&self);
}

/// Live feed of order snapshots. Dropping it deregisters the listener.
pub struct OrderSubscription {
    receiver: mpsc::UnboundedReceiver<Order>,
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl OrderSubscription {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Order>,
        on_drop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            on_drop: Some(Box::new(on_drop)),
        }
    }

    /// Next changed order, or `None` once the store has gone away.
    pub async fn recv(&mut self) -> Option<Order> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Order> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for OrderSubscription {
    fn drop(&mut self) {
        if let Some(deregister) = self.on_drop.take() {
            deregister();
        }
    }
}
