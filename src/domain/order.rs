use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::pickup_code::PickupCode;
use super::refund::RENTAL_DAYS;

/// Hours a PENDING order stays claimable after purchase.
pub const PICKUP_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting pickup.
    Pending,
    /// Picked up, rental in progress.
    Ongoing,
    /// Physically returned, refund not yet settled.
    Returned,
    /// Refund computed and queued for payout.
    PendingRefund,
    /// Terminal.
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Ongoing => "ONGOING",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::PendingRefund => "PENDING_REFUND",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    /// Unique forward successor for an order with the given rental flag.
    pub fn next_for(&self, rental: bool) -> Option<OrderStatus> {
        match (self, rental) {
            (OrderStatus::Pending, true) => Some(OrderStatus::Ongoing),
            (OrderStatus::Pending, false) => Some(OrderStatus::Completed),
            (OrderStatus::Ongoing, _) => Some(OrderStatus::Returned),
            (OrderStatus::Returned, _) => Some(OrderStatus::PendingRefund),
            (OrderStatus::PendingRefund, _) => Some(OrderStatus::Completed),
            (OrderStatus::Completed, _) => None,
        }
    }

    /// Whether `next` is a legal edge of the lifecycle graph, ignoring the
    /// rental flag.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.next_for(true) == Some(next) || self.next_for(false) == Some(next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "ONGOING" => Ok(OrderStatus::Ongoing),
            "RETURNED" => Ok(OrderStatus::Returned),
            "PENDING_REFUND" => Ok(OrderStatus::PendingRefund),
            "COMPLETED" => Ok(OrderStatus::Completed),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

/// Input for a confirmed purchase or rental.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub product_id: i64,
    pub machine_id: String,
    pub rental: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub product_id: i64,
    pub machine_id: String,
    pub pickup_code: PickupCode,
    /// Product name at time of sale.
    pub product_name: String,
    pub rental: bool,
    pub purchased_at: DateTime<Utc>,
    /// Price at time of sale. Never recomputed.
    pub total_cost: BigDecimal,
    pub status: OrderStatus,
    pub picked_up_at: Option<DateTime<Utc>>,
    /// When the machine confirmed the rental came back.
    pub returned_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<BigDecimal>,
}

impl Order {
    /// Move to `next`, returning the previous status.
    ///
    /// Only the unique successor for this order's rental flag is accepted.
    pub fn transition(&mut self, next: OrderStatus) -> Result<OrderStatus, DomainError> {
        if self.status.next_for(self.rental) != Some(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        let previous = self.status;
        self.status = next;
        Ok(previous)
    }

    pub fn pickup_deadline(&self) -> DateTime<Utc> {
        self.purchased_at + Duration::hours(PICKUP_WINDOW_HOURS)
    }

    /// Derived view: a PENDING order past its pickup deadline.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_expired_with_window(now, Duration::hours(PICKUP_WINDOW_HOURS))
    }

    pub fn is_expired_with_window(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.status == OrderStatus::Pending && now >= self.purchased_at + window
    }

    /// Rental return deadline, counted from pickup (or purchase if the
    /// pickup time was never recorded).
    pub fn rental_deadline(&self) -> Option<DateTime<Utc>> {
        if !self.rental {
            return None;
        }
        let start = self.picked_up_at.unwrap_or(self.purchased_at);
        Some(start + Duration::days(RENTAL_DAYS))
    }

    /// An ONGOING rental that has passed its return deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Ongoing
            && self.rental_deadline().is_some_and(|deadline| now > deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Ongoing,
        OrderStatus::Returned,
        OrderStatus::PendingRefund,
        OrderStatus::Completed,
    ];

    fn order(rental: bool, status: OrderStatus) -> Order {
        Order {
            id: "order-1".to_string(),
            user_id: "user-1".to_string(),
            product_id: 7,
            machine_id: "machine-1".to_string(),
            pickup_code: PickupCode::parse("123456").expect("valid code"),
            product_name: "Umbrella".to_string(),
            rental,
            purchased_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            total_cost: BigDecimal::from(10),
            status,
            picked_up_at: None,
            returned_at: None,
            refund_amount: None,
        }
    }

    #[test]
    fn every_state_accepts_only_its_successor() {
        for rental in [true, false] {
            for from in ALL {
                for to in ALL {
                    let mut o = order(rental, from);
                    let result = o.transition(to);
                    if from.next_for(rental) == Some(to) {
                        assert_eq!(result, Ok(from));
                        assert_eq!(o.status, to);
                    } else {
                        assert_eq!(result, Err(DomainError::InvalidTransition { from, to }));
                        assert_eq!(o.status, from);
                    }
                }
            }
        }
    }

    #[test]
    fn rental_walks_the_full_lifecycle() {
        let mut o = order(true, OrderStatus::Pending);
        for next in [
            OrderStatus::Ongoing,
            OrderStatus::Returned,
            OrderStatus::PendingRefund,
            OrderStatus::Completed,
        ] {
            o.transition(next).expect("forward transition");
        }
        assert!(o.status.is_terminal());
    }

    #[test]
    fn purchase_cannot_enter_ongoing() {
        let mut o = order(false, OrderStatus::Pending);
        assert!(matches!(
            o.transition(OrderStatus::Ongoing),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn rental_cannot_skip_to_completed() {
        let mut o = order(true, OrderStatus::Pending);
        assert!(o.transition(OrderStatus::Completed).is_err());
    }

    #[test]
    fn can_transition_to_ignores_rental_flag() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Ongoing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Returned.can_transition_to(OrderStatus::Ongoing));
    }

    #[test]
    fn expiry_is_derived_from_purchase_time() {
        let o = order(false, OrderStatus::Pending);
        let t = o.purchased_at;
        assert!(!o.is_expired(t + Duration::hours(23)));
        assert!(o.is_expired(t + Duration::hours(24)));
        assert_eq!(o.pickup_deadline(), t + Duration::hours(24));
    }

    #[test]
    fn picked_up_orders_never_expire() {
        let o = order(true, OrderStatus::Ongoing);
        assert!(!o.is_expired(o.purchased_at + Duration::days(30)));
    }

    #[test]
    fn overdue_after_rental_deadline() {
        let mut o = order(true, OrderStatus::Ongoing);
        let pickup = o.purchased_at + Duration::hours(1);
        o.picked_up_at = Some(pickup);
        assert_eq!(o.rental_deadline(), Some(pickup + Duration::days(6)));
        assert!(!o.is_overdue(pickup + Duration::days(6)));
        assert!(o.is_overdue(pickup + Duration::days(6) + Duration::seconds(1)));
    }

    #[test]
    fn purchases_have_no_rental_deadline() {
        assert_eq!(order(false, OrderStatus::Pending).rental_deadline(), None);
    }

    #[test]
    fn status_parses_its_display_form() {
        for status in ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status));
        }
        assert!("EXPIRED".parse::<OrderStatus>().is_err());
    }
}
