//! Serialized shape of a build manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::job::ConfigValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildManifest {
  /// Named paths, relative to a snapshot directory.
  #[serde(default)]
  pub paths: BTreeMap<String, PathDecl>,
  /// Jobs in authoring order.
  pub jobs: Vec<JobDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathDecl {
  One(String),
  Many(Vec<String>),
}

impl PathDecl {
  pub fn relative_paths(&self) -> Vec<&str> {
    match self {
      PathDecl::One(path) => vec![path.as_str()],
      PathDecl::Many(paths) => paths.iter().map(String::as_str).collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobDecl {
  pub name: String,
  #[serde(default)]
  pub alias: Option<String>,
  /// Names of entries in `paths`.
  #[serde(default)]
  pub inputs: Vec<String>,
  #[serde(default)]
  pub outputs: Vec<String>,
  #[serde(default)]
  pub args: BTreeMap<String, ArgDecl>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  pub command: CommandDecl,
}

/// An argument's default, optionally with a numeric range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgDecl {
  Spec(ArgSpecDecl),
  Value(ConfigValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgSpecDecl {
  pub default: ConfigValue,
  #[serde(default)]
  pub min: Option<f64>,
  #[serde(default)]
  pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandDecl {
  Shell(String),
  Argv(Vec<String>),
}
