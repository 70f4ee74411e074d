// src/research/mod.rs
//! Conditional research augmentation: gate + search/extraction client.

pub mod client;
pub mod gate;

pub use client::{ResearchClient, ResearchMiss, ResearchSnippet, SearchHit};
pub use gate::ResearchGate;
