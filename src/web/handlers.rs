pub mod geo;
pub mod health;
pub mod photos;
