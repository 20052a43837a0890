//! Configuration constants
//!
//! Built-in defaults for file names, tool invocations and layout. Every value
//! here can be overridden through the configuration file.

pub mod defaults;
