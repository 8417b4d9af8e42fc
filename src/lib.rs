pub mod aspect;
pub mod catalog;
pub mod controller;
pub mod files;
pub mod geometry;
pub mod gui;
pub mod hotkey;
pub mod hover;
pub mod logging;
pub mod settings;
pub mod style;
pub mod visibility;
pub mod win_util;
