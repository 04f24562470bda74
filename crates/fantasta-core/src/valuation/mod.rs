// Valuation engine: role z-scores, budget caps, suggestions, balance.

pub mod balance;
pub mod budget;
pub mod scoring;
pub mod suggest;
