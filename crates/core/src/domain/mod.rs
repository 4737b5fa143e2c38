pub mod analysis;
pub mod stock;
