//! Database models split into domain-specific modules.

pub mod client;
pub mod order;
pub mod user;

pub use client::*;
pub use order::*;
pub use user::*;
