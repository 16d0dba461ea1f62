pub mod debounce;
pub mod json_path;

pub use debounce::Debouncer;
