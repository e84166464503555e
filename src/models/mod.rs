// src/models/mod.rs

pub mod analytics;
pub mod group;
pub mod lesson;
pub mod submission;
pub mod task;
pub mod user;
