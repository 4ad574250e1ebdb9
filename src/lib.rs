//! TRMNL client for a Waveshare 7.5" e-paper panel.
//!
//! [`cycle::RefreshController`] polls the display service and pushes each
//! image through the frame converter onto the panel; [`lifecycle`] owns the
//! panel between startup and the sleep issued on termination.

pub mod client;
pub mod config;
pub mod cycle;
pub mod lifecycle;
pub mod options;
