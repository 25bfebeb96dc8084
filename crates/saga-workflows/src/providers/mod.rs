//! Simulated provider implementations used by the demos and defaults.

mod simulated_broker;
mod simulated_market;

pub use simulated_broker::SimulatedBroker;
pub use simulated_market::SimulatedMarket;
