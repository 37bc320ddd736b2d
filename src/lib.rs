pub mod config;
pub mod debounce;
pub mod events;
pub mod open;
pub mod paths;
pub mod prefs;
pub mod services;
pub mod toolbar;
