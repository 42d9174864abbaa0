//! CLI commands

pub mod list;
pub mod setup_admin;
pub mod sitemap;
