#![doc = include_str!("../README.md")]
pub mod configuration;
pub mod control_loop;
pub mod differential_controller;
pub mod driver;
pub mod error;
pub mod localisation;
pub mod logging;
pub mod navigation;
pub mod path_loader;
pub mod simulator;
pub mod waypoint_queue;
