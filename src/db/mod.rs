//! Database access layer

pub mod books;
pub mod credit_cards;
pub mod orders;
pub mod publisher_orders;
pub mod publishers;
pub mod reports;
pub mod users;
