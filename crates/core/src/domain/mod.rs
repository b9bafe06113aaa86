pub mod evaluation;
pub mod stock;
pub mod watchlist;
