pub mod cadence;
pub mod clipboard;
pub mod config;
pub mod correction;
pub mod hotkey;
pub mod keyboard;
pub mod keymap;
pub mod mode;
pub mod model;
pub mod output;
pub mod pause;
pub mod session;
pub mod sim;
pub mod typo;
