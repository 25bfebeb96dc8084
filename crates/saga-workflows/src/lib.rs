//! Concrete portfolio workflows built on [`saga_engine`].
//!
//! Two sagas live here: a four-step portfolio rebalance and a five-step
//! tax-loss harvest. Both share the broker and market-data provider seams
//! in [`traits`], with simulated implementations in [`providers`] and test
//! doubles in [`mocks`].

pub mod error;
pub mod harvest;
pub mod mocks;
pub mod providers;
pub mod rebalance;
pub mod traits;
pub mod types;
pub mod wash_sale;

pub use error::WorkflowError;
