pub mod addresses;
pub mod health;
pub mod trades;
