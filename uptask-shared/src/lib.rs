//! # UpTask Shared Library
//!
//! This crate contains the entity models, persistence layer and utilities
//! shared by the UpTask API server and its tooling.
//!
//! ## Module Organization
//!
//! - `models`: Entity records (User, Project, Task, Token)
//! - `repo`: Repository traits with PostgreSQL and in-memory stores
//! - `db`: Connection pool and migrations
//! - `auth`: Password hashing and confirmation codes
//! - `mail`: Transactional email templates, transports and dispatcher

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;
pub mod repo;

/// Current version of the UpTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
