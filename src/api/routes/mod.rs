//! Route handlers

pub mod config;
pub mod health;
pub mod monitor;
pub mod network;
