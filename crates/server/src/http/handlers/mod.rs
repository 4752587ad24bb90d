pub mod admin;
pub mod challenge;
pub mod products;
pub mod reviews;
