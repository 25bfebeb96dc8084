//! Provider seams the sagas depend on.

mod broker_provider;
mod market_data_provider;

pub use broker_provider::BrokerProvider;
pub use market_data_provider::{MarketDataProvider, MarketStatus};
