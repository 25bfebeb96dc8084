use crate::traits::{MarketDataProvider, MarketStatus};

/// Market feed pinned to a fixed session status.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedMarket {
    status: MarketStatus,
}

impl SimulatedMarket {
    #[must_use]
    pub fn open() -> Self {
        Self {
            status: MarketStatus::Open,
        }
    }

    #[must_use]
    pub fn closed() -> Self {
        Self {
            status: MarketStatus::Closed,
        }
    }
}

impl Default for SimulatedMarket {
    fn default() -> Self {
        Self::open()
    }
}

impl MarketDataProvider for SimulatedMarket {
    fn market_status(&self) -> MarketStatus {
        self.status
    }
}
