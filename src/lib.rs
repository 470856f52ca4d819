pub mod api;
pub mod app;
pub mod config;
pub mod duration;
pub mod error;
pub mod events;
pub mod form;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod store;
pub mod terminal;
pub mod ui;
