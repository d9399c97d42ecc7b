pub mod proc_loader;
pub mod proc_validator;
pub mod secrets;
pub mod settings;
pub mod sinks;
pub mod token;
pub mod types;
