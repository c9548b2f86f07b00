mod common;

mod build_tests;
mod kick_tests;
mod order_tests;
mod status_tests;
