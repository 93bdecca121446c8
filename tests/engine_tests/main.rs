//! Engine Tests
//!
//! Client, cookie server and command server behaviour over the in-memory link.

mod support;

mod server_tests;
