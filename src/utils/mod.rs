pub mod dependencies;
pub mod display;
pub mod platform;
pub mod settings;
