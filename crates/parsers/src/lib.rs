pub mod audit;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod expression;
pub mod index;
pub mod listing;
pub mod pipeline;
pub mod schedule;
pub mod util;
