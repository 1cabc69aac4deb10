//! ESP32-S3 firmware-specific modules for boardcheck
//!
//! This crate contains the code that cannot compile on desktop targets: pin
//! assignment, ESP32 peripheral setup, and the adapters that expose LEDC,
//! MCPWM, ADC and the SSD1306 panel through the boardcheck-core capability
//! traits.

#![no_std]

pub mod board;
