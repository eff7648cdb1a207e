use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::pickup_code::PickupCode;

/// Stored shape of an order, as kept by the backend document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order_id: String,
    pub user_id: String,
    pub product_id: i64,
    pub machine_id: String,
    pub pickup_code: String,
    pub product_name: String,
    pub is_rental: bool,
    /// Epoch milliseconds.
    pub purchase_timestamp: i64,
    pub total_cost: BigDecimal,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returned_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<BigDecimal>,
}

impl From<&Order> for OrderRecord {
    fn from(order: &Order) -> Self {
        OrderRecord {
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            product_id: order.product_id,
            machine_id: order.machine_id.clone(),
            pickup_code: order.pickup_code.to_string(),
            product_name: order.product_name.clone(),
            is_rental: order.rental,
            purchase_timestamp: order.purchased_at.timestamp_millis(),
            total_cost: order.total_cost.clone(),
            status: order.status,
            picked_up_at: order.picked_up_at.map(|t| t.timestamp_millis()),
            returned_at: order.returned_at.map(|t| t.timestamp_millis()),
            refund_amount: order.refund_amount.clone(),
        }
    }
}

impl TryFrom<OrderRecord> for Order {
    type Error = DomainError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let purchased_at = from_millis(record.purchase_timestamp)?;
        let picked_up_at = record.picked_up_at.map(from_millis).transpose()?;
        let returned_at = record.returned_at.map(from_millis).transpose()?;
        Ok(Order {
            id: record.order_id,
            user_id: record.user_id,
            product_id: record.product_id,
            machine_id: record.machine_id,
            pickup_code: PickupCode::parse(&record.pickup_code)?,
            product_name: record.product_name,
            rental: record.is_rental,
            purchased_at,
            total_cost: record.total_cost,
            status: record.status,
            picked_up_at,
            returned_at,
            refund_amount: record.refund_amount,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| DomainError::Internal(format!("timestamp out of range: {}", ms)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl OutboxEvent {
    fn for_order(order: &Order, event_type: &str, payload: Value) -> Self {
        OutboxEvent {
            id: Uuid::new_v4(),
            aggregate_type: "Order".to_string(),
            aggregate_id: order.id.clone(),
            event_type: event_type.to_string(),
            payload,
            created_at: Utc::now(),
        }
    }

    pub fn order_created(order: &Order) -> Self {
        let payload = json!({
            "order_id": order.id,
            "user_id": order.user_id,
            "product_id": order.product_id,
            "machine_id": order.machine_id,
            "is_rental": order.rental,
            "total_cost": order.total_cost.to_string(),
            "status": order.status,
        });
        Self::for_order(order, "OrderCreated", payload)
    }

    pub fn status_changed(order: &Order, from: OrderStatus) -> Self {
        let mut payload = json!({
            "order_id": order.id,
            "from": from,
            "to": order.status,
        });
        if let Some(refund) = &order.refund_amount {
            payload["refund_amount"] = Value::String(refund.to_string());
        }
        Self::for_order(order, "OrderStatusChanged", payload)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    fn order() -> Order {
        Order {
            id: "o-1".to_string(),
            user_id: "u-1".to_string(),
            product_id: 3,
            machine_id: "m-1".to_string(),
            pickup_code: PickupCode::parse("048213").expect("valid code"),
            product_name: "Umbrella".to_string(),
            rental: true,
            purchased_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            total_cost: BigDecimal::from_str("10.00").unwrap(),
            status: OrderStatus::Pending,
            picked_up_at: None,
            returned_at: None,
            refund_amount: None,
        }
    }

    #[test]
    fn record_uses_camel_case_fields() {
        let value = serde_json::to_value(OrderRecord::from(&order())).unwrap();
        assert_eq!(value["orderId"], "o-1");
        assert_eq!(value["isRental"], true);
        assert_eq!(value["purchaseTimestamp"], 1_700_000_000_123i64);
        assert_eq!(value["pickupCode"], "048213");
        assert_eq!(value["status"], "PENDING");
        assert!(value.get("refundAmount").is_none());
    }

    #[test]
    fn record_converts_back_to_order() {
        let original = order();
        let back = Order::try_from(OrderRecord::from(&original)).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn return_time_is_stored_as_epoch_millis() {
        let mut o = order();
        o.status = OrderStatus::Returned;
        o.picked_up_at = Some(o.purchased_at);
        o.returned_at = Some(Utc.timestamp_millis_opt(1_700_172_800_123).unwrap());

        let record = OrderRecord::from(&o);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["returnedAt"], 1_700_172_800_123i64);
        assert_eq!(Order::try_from(record).unwrap().returned_at, o.returned_at);
    }

    #[test]
    fn record_with_bad_pickup_code_is_rejected() {
        let mut record = OrderRecord::from(&order());
        record.pickup_code = "12".to_string();
        assert!(matches!(
            Order::try_from(record),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn status_changed_event_carries_refund() {
        let mut o = order();
        o.status = OrderStatus::PendingRefund;
        o.refund_amount = Some(BigDecimal::from_str("7.2").unwrap());
        let event = OutboxEvent::status_changed(&o, OrderStatus::Returned);
        assert_eq!(event.aggregate_type, "Order");
        assert_eq!(event.event_type, "OrderStatusChanged");
        assert_eq!(event.payload["from"], "RETURNED");
        assert_eq!(event.payload["to"], "PENDING_REFUND");
        assert_eq!(event.payload["refund_amount"], "7.2");
    }
}
