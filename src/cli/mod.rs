pub mod convert;
pub mod market;
pub mod portfolio;
pub mod refresh;
pub mod settings;
pub mod setup;
pub mod ui;
