/// Whether orders can currently be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    Open,
    Closed,
}

/// Market session seam, consulted before any orders go out.
pub trait MarketDataProvider: Send + Sync {
    fn market_status(&self) -> MarketStatus;
}
