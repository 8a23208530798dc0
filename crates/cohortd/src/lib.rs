//! Session lifecycle orchestrator for cohort schedule tables.
//!
//! Three responsibilities: provisioning online-meeting links ahead of
//! upcoming sessions, reconciling completed sessions with cloud
//! recordings, and mutating session schedule/mentor state while keeping
//! dependent state (links, notifications) consistent.

pub mod batch;
pub mod cohort;
pub mod config;
pub mod db;
pub mod drive;
pub mod graph;
pub mod mutation;
pub mod notify;
pub mod server;
pub mod types;
