//! Wire types shared by the Terra database, API and server crates.

pub mod api;
pub mod carbon;
pub mod models;
