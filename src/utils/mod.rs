pub mod cache;

pub use cache::{Cache, HistoryCache, PriceCache};
