use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderStatus, PICKUP_WINDOW_HOURS};
use crate::domain::pickup_code::PickupCode;
use crate::domain::ports::{CatalogRepository, OrderRepository, OrderSubscription};
use crate::domain::refund;

/// Drives orders through their lifecycle against the order store.
///
/// Callers pass `now` explicitly; the service never reads the clock.
pub struct OrderService<R, C> {
    repo: R,
    catalog: C,
    pickup_window: Duration,
}

impl<R: OrderRepository, C: CatalogRepository> OrderService<R, C> {
    pub fn new(repo: R, catalog: C) -> Self {
        Self {
            repo,
            catalog,
            pickup_window: Duration::hours(PICKUP_WINDOW_HOURS),
        }
    }

    pub fn with_pickup_window(mut self, window: Duration) -> Self {
        self.pickup_window = window;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn create_order(&self, input: NewOrder, now: DateTime<Utc>) -> Result<Order, DomainError> {
        let product = self
            .catalog
            .product(input.product_id)?
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown product {}", input.product_id)))?;
        let machine = self
            .catalog
            .machine(&input.machine_id)?
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown machine {}", input.machine_id)))?;

        let total_cost = product
            .price_for(input.rental)
            .cloned()
            .ok_or(DomainError::NotRentable(product.id))?;
        if !machine.has_stock(product.id) {
            log::warn!("product {} out of stock at machine {}", product.id, machine.id);
            return Err(DomainError::OutOfStock {
                product_id: product.id,
                machine_id: machine.id,
            });
        }

        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: input.user_id,
            product_id: product.id,
            machine_id: machine.id,
            pickup_code: PickupCode::generate(),
            product_name: product.name,
            rental: input.rental,
            purchased_at: now,
            total_cost,
            status: OrderStatus::Pending,
            picked_up_at: None,
            returned_at: None,
            refund_amount: None,
        };
        self.repo.create(&order)?;

        log::info!(
            "created {} order {} for user {} (product {}, cost {})",
            if order.rental { "rental" } else { "purchase" },
            order.id,
            order.user_id,
            order.product_id,
            refund::to_currency(&order.total_cost)
        );
        Ok(order)
    }

    pub fn get_order(&self, id: &str) -> Result<Option<Order>, DomainError> {
        self.repo.find_by_id(id)
    }

    /// All of a user's orders, newest first.
    pub fn order_history(&self, user_id: &str) -> Result<Vec<Order>, DomainError> {
        self.repo.list_for_user(user_id)
    }

    pub fn is_expired(&self, order: &Order, now: DateTime<Utc>) -> bool {
        order.is_expired_with_window(now, self.pickup_window)
    }

    /// Machine dispensed the item: rentals become ONGOING, purchases
    /// COMPLETED.
    pub fn confirm_pickup(&self, id: &str, now: DateTime<Utc>) -> Result<Order, DomainError> {
        let mut order = self.load(id)?;
        if self.is_expired(&order, now) {
            log::warn!("pickup rejected, order {} expired at {}", id, order.purchased_at + self.pickup_window);
            return Err(DomainError::PickupExpired(order.id));
        }
        let next = if order.rental {
            OrderStatus::Ongoing
        } else {
            OrderStatus::Completed
        };
        order.picked_up_at = Some(now);
        self.apply(order, next)
    }

    /// Machine took the rented item back at `now`.
    pub fn confirm_return(&self, id: &str, now: DateTime<Utc>) -> Result<Order, DomainError> {
        let mut order = self.load(id)?;
        order.returned_at = Some(now);
        self.apply(order, OrderStatus::Returned)
    }

    /// Refund for a rental: counted up to its recorded return, or up to
    /// `now` while it is still out.
    pub fn refund_quote(&self, order: &Order, now: DateTime<Utc>) -> Result<BigDecimal, DomainError> {
        if !order.rental {
            return Err(DomainError::NotRentable(order.product_id));
        }
        let start = order.picked_up_at.unwrap_or(order.purchased_at);
        let end = order.returned_at.unwrap_or(now);
        refund::refund_at(&order.total_cost, start, end)
    }

    /// Compute the refund for a returned rental and queue it for payout.
    /// The amount depends only on the recorded return time.
    pub fn queue_refund(&self, id: &str) -> Result<Order, DomainError> {
        let mut order = self.load(id)?;
        if order.status != OrderStatus::Returned {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: OrderStatus::PendingRefund,
            });
        }
        let returned_at = order
            .returned_at
            .ok_or_else(|| DomainError::Internal(format!("order {} has no return time", order.id)))?;
        order.refund_amount = Some(self.refund_quote(&order, returned_at)?);
        self.apply(order, OrderStatus::PendingRefund)
    }

    pub fn settle_refund(&self, id: &str) -> Result<Order, DomainError> {
        let order = self.load(id)?;
        if order.status != OrderStatus::PendingRefund {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Completed,
            });
        }
        self.apply(order, OrderStatus::Completed)
    }

    pub fn subscribe(&self, user_id: &str) -> Result<OrderSubscription, DomainError> {
        self.repo.subscribe(user_id)
    }

    fn load(&self, id: &str) -> Result<Order, DomainError> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))
    }

    fn apply(&self, mut order: Order, next: OrderStatus) -> Result<Order, DomainError> {
        let previous = order.transition(next).inspect_err(|e| {
            log::warn!("order {}: {}", order.id, e);
        })?;
        self.repo.save_transition(&order, previous)?;
        log::info!("order {} moved {} -> {}", order.id, previous, order.status);
        Ok(order)
    }
}
