//! Attendance projection and weekly-schedule engine behind the `edutrackerd`
//! sidecar.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod ipc;
pub mod models;
pub mod projection;
pub mod schedule;
pub mod time;
