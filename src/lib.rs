pub mod catalog;
pub mod core;
pub mod gateway;
pub mod ledger;
pub mod readers;
pub mod utils;
