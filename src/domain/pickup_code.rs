use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

pub const PICKUP_CODE_LENGTH: usize = 6;

/// Fixed-length numeric code played to a machine to claim an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PickupCode(String);

impl PickupCode {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let n: u32 = rng.gen_range(0..1_000_000);
        PickupCode(format!("{:0width$}", n, width = PICKUP_CODE_LENGTH))
    }

    pub fn parse(code: &str) -> Result<Self, DomainError> {
        if code.len() != PICKUP_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidInput(format!(
                "pickup code must be {} digits, got '{}'",
                PICKUP_CODE_LENGTH, code
            )));
        }
        Ok(PickupCode(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PickupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PickupCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PickupCode::parse(&value)
    }
}

impl From<PickupCode> for String {
    fn from(code: PickupCode) -> Self {
        code.0
    }
}
