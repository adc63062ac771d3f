//! Integration tests against real marker directories

mod common;
mod marker_tests;
mod shell_tests;
