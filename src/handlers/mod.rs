// src/handlers/mod.rs

pub mod auth;
pub mod groups;
pub mod lessons;
pub mod student;
pub mod tasks;
