pub mod config;
pub mod fetch;
pub mod monitor;
pub mod notify;
pub mod page_parser;
pub mod prefs;
pub mod reconcile;
pub mod standings;
pub mod store;
pub mod transitions;
pub mod types;
pub mod web;
