//! Terminal rendering and command runners

pub mod news;
pub mod portfolio;
pub mod setup;
pub mod ui;
pub mod watchlist;
