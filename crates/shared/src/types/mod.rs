//! Common types used across the application.

pub mod component;
pub mod id;
pub mod money;

pub use component::{ComponentCosts, CostComponent};
pub use id::RunId;
pub use money::{Cents, MoneyError, cents_to_decimal, decimal_to_cents, format_cents};
