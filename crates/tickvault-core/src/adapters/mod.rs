//! Provider adapters implementing [`MarketFeed`](crate::MarketFeed).

mod eastmoney;

pub use eastmoney::EastmoneyAdapter;
