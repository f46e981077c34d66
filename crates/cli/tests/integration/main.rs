mod common;
mod run_tests;
mod snapshot_tests;
