//! Touch-controls layout editor engine
//!
//! Lets a user reposition and resize on-screen controller elements and
//! persists the result per controller and screen orientation.
//!
//! - [`bounds`]: live screen-space bounds of every rendered element
//! - [`gesture`]: pointer interception and pan/zoom editing
//! - [`layout`]: default positions and final placement
//! - [`session`]: one editing session, from load to save
//! - [`config`] and [`persistence`]: editor config and settings storage

#![forbid(unsafe_code)]

pub mod bounds;
pub mod config;
pub mod constants;
pub mod geometry;
pub mod gesture;
pub mod layout;
pub mod persistence;
pub mod session;
pub mod types;
