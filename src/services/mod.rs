// src/services/mod.rs

pub mod rating;
