// src/core/mod.rs — Tournament core: entity source, comparator, bracket engine

pub mod bracket;
pub mod comparator;
pub mod entities;
pub mod orchestrator;
pub mod types;
