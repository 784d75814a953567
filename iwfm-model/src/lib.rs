pub mod casgem;
pub mod config;
pub mod error;
pub mod hydrograph;
pub mod stratigraphy;
pub mod time_spec;
pub mod well;
