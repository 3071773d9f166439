//! bookstore-server — online bookstore backend
//!
//! Long-running service that:
//! - Serves the public catalog (listing, search, detail, cover images)
//! - Places customer orders atomically (stock, pricing, payment instrument)
//! - Manages user accounts (JWT authenticated)
//! - Provides the admin console API (book CRUD, publisher orders, reports)

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod util;
