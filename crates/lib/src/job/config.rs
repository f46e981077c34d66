//! Typed job configuration.
//!
//! Every job declares the arguments it accepts as [`ArgSpec`]s. Values are
//! plain literals ([`ConfigValue`]) so that a configuration record can be
//! written to and read back from a snapshot without ever executing anything.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A literal configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
  Bool(bool),
  Int(i64),
  Float(f64),
  String(String),
  List(Vec<ConfigValue>),
  Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
  pub fn kind(&self) -> ValueKind {
    match self {
      ConfigValue::Bool(_) => ValueKind::Bool,
      ConfigValue::Int(_) => ValueKind::Int,
      ConfigValue::Float(_) => ValueKind::Float,
      ConfigValue::String(_) => ValueKind::String,
      ConfigValue::List(_) => ValueKind::List,
      ConfigValue::Map(_) => ValueKind::Map,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      ConfigValue::Int(i) => Some(*i as f64),
      ConfigValue::Float(f) => Some(*f),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      ConfigValue::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      ConfigValue::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      ConfigValue::String(s) => Some(s),
      _ => None,
    }
  }

  /// Parse a command-line value: a JSON literal if it is one, else a plain string.
  pub fn parse_literal(raw: &str) -> ConfigValue {
    serde_json::from_str(raw).unwrap_or_else(|_| ConfigValue::String(raw.to_string()))
  }
}

impl fmt::Display for ConfigValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigValue::String(s) => f.write_str(s),
      other => match serde_json::to_string(other) {
        Ok(json) => f.write_str(&json),
        Err(_) => Err(fmt::Error),
      },
    }
  }
}

impl From<bool> for ConfigValue {
  fn from(value: bool) -> Self {
    ConfigValue::Bool(value)
  }
}

impl From<i64> for ConfigValue {
  fn from(value: i64) -> Self {
    ConfigValue::Int(value)
  }
}

impl From<i32> for ConfigValue {
  fn from(value: i32) -> Self {
    ConfigValue::Int(value.into())
  }
}

impl From<f64> for ConfigValue {
  fn from(value: f64) -> Self {
    ConfigValue::Float(value)
  }
}

impl From<&str> for ConfigValue {
  fn from(value: &str) -> Self {
    ConfigValue::String(value.to_string())
  }
}

impl From<String> for ConfigValue {
  fn from(value: String) -> Self {
    ConfigValue::String(value)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
  Bool,
  Int,
  Float,
  String,
  List,
  Map,
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ValueKind::Bool => "bool",
      ValueKind::Int => "int",
      ValueKind::Float => "float",
      ValueKind::String => "string",
      ValueKind::List => "list",
      ValueKind::Map => "map",
    };
    f.write_str(name)
  }
}

/// Invalid configuration: unknown jobs, unknown arguments or bad values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
  #[error("invalid config: no job named '{0}'")]
  UnknownJob(String),

  #[error("invalid config: job '{job}' has no argument '{arg}'")]
  UnknownArgument { job: String, arg: String },

  #[error("invalid config: argument '{arg}' of job '{job}' expects {expected}, got {found}")]
  TypeMismatch {
    job: String,
    arg: String,
    expected: ValueKind,
    found: ValueKind,
  },

  #[error("invalid config: argument '{arg}' of job '{job}' is {value}, outside [{min}, {max}]")]
  OutOfRange {
    job: String,
    arg: String,
    value: f64,
    min: f64,
    max: f64,
  },

  #[error("invalid config: malformed key '{0}', expected '<alias>.<argument>'")]
  MalformedKey(String),
}

/// Declaration of one accepted argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
  pub name: String,
  pub default: ConfigValue,
  pub min: Option<f64>,
  pub max: Option<f64>,
}

impl ArgSpec {
  pub fn new(name: impl Into<String>, default: impl Into<ConfigValue>) -> Self {
    Self {
      name: name.into(),
      default: default.into(),
      min: None,
      max: None,
    }
  }

  pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
    self.min = min;
    self.max = max;
    self
  }

  pub fn kind(&self) -> ValueKind {
    self.default.kind()
  }

  /// Check `value` against this declaration and normalize it.
  ///
  /// Integers are accepted for float arguments and stored as floats so that
  /// equal configurations always compare equal.
  pub fn validate(&self, job: &str, value: &ConfigValue) -> Result<ConfigValue, ConfigError> {
    let value = match (self.kind(), value) {
      (ValueKind::Float, ConfigValue::Int(i)) => ConfigValue::Float(*i as f64),
      (expected, value) if expected == value.kind() => value.clone(),
      (expected, value) => {
        return Err(ConfigError::TypeMismatch {
          job: job.to_string(),
          arg: self.name.clone(),
          expected,
          found: value.kind(),
        });
      }
    };

    if let Some(number) = value.as_f64() {
      let min = self.min.unwrap_or(f64::NEG_INFINITY);
      let max = self.max.unwrap_or(f64::INFINITY);
      if number < min || number > max {
        return Err(ConfigError::OutOfRange {
          job: job.to_string(),
          arg: self.name.clone(),
          value: number,
          min,
          max,
        });
      }
    }

    Ok(value)
  }
}

/// Effective argument values of one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobConfig(BTreeMap<String, ConfigValue>);

impl JobConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, arg: &str) -> Option<&ConfigValue> {
    self.0.get(arg)
  }

  pub fn insert(&mut self, arg: impl Into<String>, value: ConfigValue) {
    self.0.insert(arg.into(), value);
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl FromIterator<(String, ConfigValue)> for JobConfig {
  fn from_iter<T: IntoIterator<Item = (String, ConfigValue)>>(iter: T) -> Self {
    JobConfig(iter.into_iter().collect())
  }
}

/// Configuration of a whole build, keyed by job name.
///
/// This is the shape of the configuration record persisted in every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildConfig(BTreeMap<String, JobConfig>);

impl BuildConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, job_name: &str) -> Option<&JobConfig> {
    self.0.get(job_name)
  }

  pub fn insert(&mut self, job_name: impl Into<String>, config: JobConfig) {
    self.0.insert(job_name.into(), config);
  }

  pub fn contains(&self, job_name: &str) -> bool {
    self.0.contains_key(job_name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &JobConfig)> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl FromIterator<(String, JobConfig)> for BuildConfig {
  fn from_iter<T: IntoIterator<Item = (String, JobConfig)>>(iter: T) -> Self {
    BuildConfig(iter.into_iter().collect())
  }
}
