pub mod asset;
pub mod market;

pub use asset::{AssetMetadata, AssetRecord, SwapResult};
pub use market::{CoinPrice, CoinSearchHit, PriceHistory, PricePoint, USD};
