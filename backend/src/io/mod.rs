//! # IO Layer
//!
//! Interfaces that expose the domain to the outside world. Currently the
//! REST API only.

pub mod rest;
