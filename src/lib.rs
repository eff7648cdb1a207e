pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infrastructure;

use bigdecimal::BigDecimal;
use std::str::FromStr;

pub use application::order_service::OrderService;
pub use application::playback::{PickupCodePlayer, PlaybackOutcome, PlaybackProgress};
pub use config::Settings;
pub use domain::errors::{DomainError, PlaybackError};
pub use domain::order::{NewOrder, Order, OrderStatus};
pub use errors::AppError;

use domain::catalog::{Machine, Product};
use infrastructure::catalog_repo::InMemoryCatalog;

/// Small catalog used by the demo binary and integration tests.
pub fn demo_catalog() -> Result<InMemoryCatalog, AppError> {
    let price = |s: &str| {
        BigDecimal::from_str(s).map_err(|e| AppError::Config(format!("bad price '{}': {}", s, e)))
    };

    let products = vec![
        Product {
            id: 1,
            name: "Umbrella".to_string(),
            description: "Compact folding umbrella".to_string(),
            price: price("25.00")?,
            rental_price: Some(price("10.00")?),
            categories: vec!["Weather".to_string()],
            image: "umbrella".to_string(),
        },
        Product {
            id: 2,
            name: "Phone charger".to_string(),
            description: "USB-C fast charger".to_string(),
            price: price("19.99")?,
            rental_price: Some(price("4.99")?),
            categories: vec!["Electronics".to_string()],
            image: "charger".to_string(),
        },
        Product {
            id: 3,
            name: "Granola bar".to_string(),
            description: "Oats and honey".to_string(),
            price: price("1.50")?,
            rental_price: None,
            categories: vec!["Snacks".to_string()],
            image: "granola".to_string(),
        },
    ];

    let machines = vec![Machine {
        id: "library-lobby".to_string(),
        name: "Library lobby".to_string(),
        latitude: 45.5048,
        longitude: -73.5772,
        stock: [(1, 4), (2, 2), (3, 12)].into_iter().collect(),
        site: "Downtown campus".to_string(),
        building: "Main library".to_string(),
        floor: "Ground".to_string(),
        address: "3459 McTavish St".to_string(),
    }];

    Ok(InMemoryCatalog::new(products, machines))
}
