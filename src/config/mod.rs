//! Configuration module

mod site;

pub use site::BackendCredentials;
pub use site::SiteConfig;
pub use site::CONFIG_FILE;
