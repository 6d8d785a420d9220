//! vrgate - media gateway for VR playback clients
//!
//! This library crate exposes configuration loading for the binary and for
//! integration testing. The gateway itself lives in the `vg-*` crates.

pub mod config;
