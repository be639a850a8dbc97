pub mod classify;
pub mod coinmarketcap;
pub mod util;

pub use coinmarketcap::CoinMarketCapProvider;
