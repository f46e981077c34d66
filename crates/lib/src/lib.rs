//! wikimap-lib: incremental build orchestration over numbered snapshots
//!
//! A pipeline is an ordered list of jobs, each declaring the artifacts it
//! reads and writes relative to a snapshot directory:
//! - `Job`: a named unit of work with declared paths and typed arguments
//! - `Build`: the planned, configured set of jobs for one invocation
//! - `BuildDirectoryStore`: the archive of `prefixN` snapshot directories
//! - `BuildRunner`: reruns what changed and hard-links everything else

pub mod body;
pub mod build;
pub mod checker;
pub mod consts;
pub mod guard;
pub mod interrupt;
pub mod job;
pub mod manifest;
pub mod path;
pub mod plan;
pub mod registry;
pub mod runner;
pub mod settings;
pub mod store;
