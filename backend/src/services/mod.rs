// src/services/mod.rs

pub mod accounts;
pub mod attempt;
pub mod crud;
pub mod stats;
