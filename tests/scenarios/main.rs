//! End-to-end container scenarios over the in-memory store

#[path = "../common/mod.rs"]
mod common;

mod cache_behavior;
mod collisions;
mod configuration;
mod lifecycle;
mod parent_scenario;
mod properties;
