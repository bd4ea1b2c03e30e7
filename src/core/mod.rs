//! Core layer: shared building blocks
//!
//! Configuration, seeded randomness, calendar helpers, the word-list faker and
//! on-disk storage of generated data

pub mod calendar;
pub mod config;
pub mod faker;
pub mod rng;
pub mod store;
