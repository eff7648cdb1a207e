use thiserror::Error;

use super::order::OrderStatus;

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Rental day out of range: {0}")]
    OutOfRange(i64),
    #[error("Pickup window expired for order {0}")]
    PickupExpired(String),
    #[error("Product {product_id} is out of stock at machine {machine_id}")]
    OutOfStock { product_id: i64, machine_id: String },
    #[error("Product {0} cannot be rented")]
    NotRentable(i64),
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum PlaybackError {
    #[error("Already playing")]
    AlreadyPlaying,
    #[error("Tone output failed: {0}")]
    Output(String),
}
