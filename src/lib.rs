//! Configuration portal and device logic of the portable Wi-Fi repeater.
//!
//! Everything in this crate builds on the host; the ESP-IDF binary in
//! `main.rs` (feature `firmware`) wires it to the radio, NVS and the LED.

pub mod captive_portal;
pub mod identify;
pub mod link;
pub mod setting;
