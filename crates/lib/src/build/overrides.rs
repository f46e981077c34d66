//! Flat `alias.arg = value` overrides.

use std::collections::BTreeMap;

use crate::job::{ConfigError, ConfigValue};

use super::Build;

/// Per-job argument overrides keyed by job name.
pub type Overrides = BTreeMap<String, BTreeMap<String, ConfigValue>>;

/// Convert `{"alias.arg": value}` into `{job_name: {arg: value}}`.
///
/// The part before the first dot may be an alias or a job name.
pub fn nest_overrides(build: &Build, flat: &BTreeMap<String, ConfigValue>) -> Result<Overrides, ConfigError> {
  let mut nested = Overrides::new();
  for (key, value) in flat {
    let (job_key, arg) = key
      .split_once('.')
      .filter(|(job_key, arg)| !job_key.is_empty() && !arg.is_empty())
      .ok_or_else(|| ConfigError::MalformedKey(key.clone()))?;
    let job = build
      .by_name(job_key)
      .or_else(|| build.by_alias(job_key))
      .ok_or_else(|| ConfigError::UnknownJob(job_key.to_string()))?;
    nested
      .entry(job.name().to_string())
      .or_default()
      .insert(arg.to_string(), value.clone());
  }
  Ok(nested)
}

/// Split a `KEY=VALUE` command-line assignment, parsing the value as a literal.
pub fn parse_assignment(raw: &str) -> Result<(String, ConfigValue), ConfigError> {
  let (key, value) = raw
    .split_once('=')
    .ok_or_else(|| ConfigError::MalformedKey(raw.to_string()))?;
  Ok((key.trim().to_string(), ConfigValue::parse_literal(value.trim())))
}
