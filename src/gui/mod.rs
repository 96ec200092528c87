//! Desktop editor host

pub mod constants;
mod editor;
mod input;

pub use editor::run_editor;
