pub mod context;
pub mod flat_json;
pub mod template;
