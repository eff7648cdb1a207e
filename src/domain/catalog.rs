use std::collections::HashMap;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    /// `None` means the product cannot be rented.
    pub rental_price: Option<BigDecimal>,
    pub categories: Vec<String>,
    pub image: String,
}

impl Product {
    pub fn is_rentable(&self) -> bool {
        self.rental_price.is_some()
    }

    /// Price charged for a purchase or, when `rental` is set, a rental.
    pub fn price_for(&self, rental: bool) -> Option<&BigDecimal> {
        if rental {
            self.rental_price.as_ref()
        } else {
            Some(&self.price)
        }
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Product id to quantity on hand.
    pub stock: HashMap<i64, u32>,
    pub site: String,
    pub building: String,
    pub floor: String,
    pub address: String,
}

impl Machine {
    pub fn stock_of(&self, product_id: i64) -> u32 {
        self.stock.get(&product_id).copied().unwrap_or(0)
    }

    pub fn has_stock(&self, product_id: i64) -> bool {
        self.stock_of(product_id) > 0
    }
}

pub fn products_in_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.in_category(category)).collect()
}

/// Case-insensitive substring match on the product name.
pub fn search_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return products.iter().collect();
    }
    products
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .collect()
}

pub fn machines_stocking(machines: &[Machine], product_id: i64) -> Vec<&Machine> {
    machines.iter().filter(|m| m.has_stock(product_id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str, rental: Option<i64>, categories: &[&str]) -> Product {
        Product {
            id,
            name: name.to_string(),
            description: String::new(),
            price: BigDecimal::from(20),
            rental_price: rental.map(BigDecimal::from),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            image: format!("product_{}", id),
        }
    }

    fn machine(id: &str, stock: &[(i64, u32)]) -> Machine {
        Machine {
            id: id.to_string(),
            name: format!("Machine {}", id),
            latitude: 0.0,
            longitude: 0.0,
            stock: stock.iter().copied().collect(),
            site: "Main campus".to_string(),
            building: "Library".to_string(),
            floor: "1".to_string(),
            address: "1 University Ave".to_string(),
        }
    }

    #[test]
    fn rental_price_decides_rentability() {
        let rentable = product(1, "Umbrella", Some(10), &[]);
        let not = product(2, "Snack", None, &[]);
        assert!(rentable.is_rentable());
        assert_eq!(rentable.price_for(true), Some(&BigDecimal::from(10)));
        assert!(!not.is_rentable());
        assert_eq!(not.price_for(true), None);
        assert_eq!(not.price_for(false), Some(&BigDecimal::from(20)));
    }

    #[test]
    fn filters_by_category_ignoring_case() {
        let products = vec![
            product(1, "Umbrella", Some(10), &["Weather"]),
            product(2, "Charger", Some(5), &["Electronics"]),
        ];
        let found = products_in_category(&products, "weather");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn search_matches_name_substring() {
        let products = vec![
            product(1, "USB-C Charger", Some(5), &[]),
            product(2, "Lightning Charger", Some(5), &[]),
            product(3, "Umbrella", Some(10), &[]),
        ];
        assert_eq!(search_products(&products, "charger").len(), 2);
        assert_eq!(search_products(&products, "  ").len(), 3);
        assert!(search_products(&products, "laptop").is_empty());
    }

    #[test]
    fn machines_with_stock_only() {
        let machines = vec![machine("a", &[(1, 2)]), machine("b", &[(1, 0)]), machine("c", &[])];
        let found = machines_stocking(&machines, 1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
        assert_eq!(machines[2].stock_of(1), 0);
    }
}
