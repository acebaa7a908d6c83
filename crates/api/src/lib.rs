//! `bookstock-api` — HTTP surface over the inventory service.

pub mod app;
pub mod config;
