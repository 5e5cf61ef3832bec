// src/services/mod.rs

pub mod authoring;
pub mod live;
