//! Request handlers, one module per resource.

pub mod account;
pub mod deposit;
pub mod market;
pub mod swap;
pub mod wallet;
pub mod withdrawal;
