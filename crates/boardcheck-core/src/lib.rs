//! Hardware-independent core of the boardcheck self-test harness
//!
//! This crate contains everything that does not touch registers: the
//! peripheral registry, bring-up and functional tests, the button debouncer,
//! the paged status display, the LED rainbow animation and the cooperative
//! main loop that ties them together. Peripherals are consumed through the
//! small capability traits in [`ui`], [`outputs`], [`sensors`], [`storage`],
//! [`input`] and [`time`].
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod animation;
pub mod app_state;
pub mod board;
pub mod bringup;
pub mod color;
pub mod config;
pub mod display_manager;
pub mod framebuffer;
pub mod harness;
pub mod input;
pub mod outputs;
pub mod pages;
pub mod scheduler;
pub mod sensors;
pub mod storage;
pub mod time;
pub mod ui;

#[cfg(test)]
mod testing;

pub use app_state::{
    AppError, Health, Peripheral, PeripheralError, Registry, StopReason, StopSignal,
};
pub use board::Board;
pub use config::HarnessConfig;
pub use harness::{Harness, ShutdownReport};
