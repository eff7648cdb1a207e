use std::collections::HashMap;

use crate::domain::catalog::{Machine, Product};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;

/// Read-only catalog loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: HashMap<i64, Product>,
    machines: HashMap<String, Machine>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>, machines: Vec<Machine>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            machines: machines.into_iter().map(|m| (m.id.clone(), m)).collect(),
        }
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn product(&self, id: i64) -> Result<Option<Product>, DomainError> {
        Ok(self.products.get(&id).cloned())
    }

    fn products(&self) -> Result<Vec<Product>, DomainError> {
        let mut products: Vec<Product> = self.products.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    fn machine(&self, id: &str) -> Result<Option<Machine>, DomainError> {
        Ok(self.machines.get(id).cloned())
    }

    fn machines(&self) -> Result<Vec<Machine>, DomainError> {
        let mut machines: Vec<Machine> = self.machines.values().cloned().collect();
        machines.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(machines)
    }
}
