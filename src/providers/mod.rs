pub mod simulated;
pub mod yahoo_finance;
