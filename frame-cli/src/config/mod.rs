//! Configuration management: defaults, validation, loading from the environment.

pub mod defaults;
pub mod device_config;
pub mod validation;

pub use device_config::DeviceConfig;
