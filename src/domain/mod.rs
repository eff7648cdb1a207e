pub mod catalog;
pub mod dtmf;
pub mod errors;
pub mod order;
pub mod pickup_code;
pub mod ports;
pub mod refund;
