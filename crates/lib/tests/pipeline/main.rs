mod common;
mod failure_tests;
mod incremental_tests;
mod planning_tests;
