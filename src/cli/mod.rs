pub mod account;
pub mod alerts;
pub mod convert;
pub mod currencies;
pub mod plans;
pub mod predict;
pub mod setup;
pub mod ui;
