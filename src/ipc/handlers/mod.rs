pub mod activity;
pub mod core;
pub mod counter;
pub mod courses;
pub mod dashboard;
pub mod profile;
pub mod schedule;
pub mod settings;
pub mod tasks;
pub mod time;
