// Framework layer: runtime bootstrap, configuration, local persistence.

pub mod client;
pub mod config;
pub mod profile;
