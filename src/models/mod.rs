// src/models/mod.rs

pub mod creator;
pub mod participant;
pub mod quiz;
pub mod submission;
