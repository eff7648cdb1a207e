use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{OrderRepository, OrderSubscription};

use super::models::{OrderRecord, OutboxEvent};

// ── Store state ──────────────────────────────────────────────────────────────

struct Listener {
    id: u64,
    user_id: String,
    sender: mpsc::UnboundedSender<Order>,
}

#[derive(Default)]
struct State {
    orders: HashMap<String, OrderRecord>,
    outbox: Vec<OutboxEvent>,
    listeners: Vec<Listener>,
    next_listener: u64,
}

impl State {
    fn notify(&mut self, order: &Order) {
        // Listeners whose handle was dropped without deregistering go too.
        self.listeners.retain(|l| {
            l.user_id != order.user_id || l.sender.send(order.clone()).is_ok()
        });
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

/// Order store that keeps records, their outbox and live listeners in
/// memory. Every write and its outbox event happen under one lock.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|e| DomainError::Internal(format!("order store poisoned: {}", e)))
    }

    /// Snapshot of all outbox events for `order_id`, oldest first.
    pub fn outbox_for(&self, order_id: &str) -> Result<Vec<OutboxEvent>, DomainError> {
        Ok(self
            .lock()?
            .outbox
            .iter()
            .filter(|e| e.aggregate_id == order_id)
            .cloned()
            .collect())
    }

    /// Remove and return every pending outbox event.
    pub fn drain_outbox(&self) -> Result<Vec<OutboxEvent>, DomainError> {
        Ok(std::mem::take(&mut self.lock()?.outbox))
    }

    pub fn listener_count(&self) -> Result<usize, DomainError> {
        Ok(self.lock()?.listeners.len())
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn create(&self, order: &Order) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        if state.orders.contains_key(&order.id) {
            return Err(DomainError::InvalidInput(format!(
                "order {} already exists",
                order.id
            )));
        }
        state
            .orders
            .insert(order.id.clone(), OrderRecord::from(order));
        state.outbox.push(OutboxEvent::order_created(order));
        state.notify(order);
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Order>, DomainError> {
        let state = self.lock()?;
        state
            .orders
            .get(id)
            .cloned()
            .map(Order::try_from)
            .transpose()
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>, DomainError> {
        let state = self.lock()?;
        let mut orders = state
            .orders
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        orders.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(orders)
    }

    fn save_transition(&self, order: &Order, expected: OrderStatus) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| DomainError::NotFound(order.id.clone()))?;

        if stored.status != expected {
            return Err(DomainError::InvalidTransition {
                from: stored.status,
                to: order.status,
            });
        }
        *stored = OrderRecord::from(order);

        state.outbox.push(OutboxEvent::status_changed(order, expected));
        state.notify(order);
        Ok(())
    }

    fn subscribe(&self, user_id: &str) -> Result<OrderSubscription, DomainError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = {
            let mut state = self.lock()?;
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.push(Listener {
                id,
                user_id: user_id.to_string(),
                sender,
            });
            id
        };

        let weak = Arc::downgrade(&self.state);
        Ok(OrderSubscription::new(receiver, move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if let Ok(mut guard) = state.lock() {
                guard.listeners.retain(|l| l.id != id);
            };
        }))
    }
}
