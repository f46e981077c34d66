//! Job selection expressions.
//!
//! ```text
//! *          every job
//! 4          one job, by position, name or alias
//! 3-7        inclusive range
//! -4         from the first job through 4
//! 5-         from 5 through the last job
//! PR,3-5,W2V comma-separated union
//! ```

use std::collections::BTreeSet;

use super::PlanError;

/// Resolve `expr` to a set of job positions.
///
/// `lookup` maps a job name or alias to its position. Every bound may be a
/// position, a name or an alias; empty list entries are ignored.
pub fn parse_job_ranges<F>(expr: &str, len: usize, lookup: F) -> Result<BTreeSet<usize>, PlanError>
where
  F: Fn(&str) -> Option<usize>,
{
  let mut positions = BTreeSet::new();
  let last = len.checked_sub(1);

  for part in expr.split(',').map(str::trim).filter(|part| !part.is_empty()) {
    if part == "*" {
      positions.extend(0..len);
      continue;
    }

    // A whole token that names a job wins over a range split, so names may contain '-'.
    if let Some(position) = lookup(part) {
      positions.insert(position);
      continue;
    }

    let (start, end) = match part.split_once('-') {
      None => {
        let position = resolve_bound(part, len, &lookup)?;
        (position, position)
      }
      Some((start, end)) => {
        let start = match start.trim() {
          "" => 0,
          token => resolve_bound(token, len, &lookup)?,
        };
        let end = match end.trim() {
          "" => last.ok_or_else(|| PlanError::InvalidRange(part.to_string()))?,
          token => resolve_bound(token, len, &lookup)?,
        };
        (start, end)
      }
    };

    if start > end {
      return Err(PlanError::InvalidRange(part.to_string()));
    }
    positions.extend(start..=end);
  }

  Ok(positions)
}

fn resolve_bound<F>(token: &str, len: usize, lookup: &F) -> Result<usize, PlanError>
where
  F: Fn(&str) -> Option<usize>,
{
  let position = match token.parse::<usize>() {
    Ok(position) => position,
    Err(_) => lookup(token).ok_or_else(|| PlanError::UnresolvedToken(token.to_string()))?,
  };
  if position >= len {
    return Err(PlanError::PositionOutOfRange { position, len });
  }
  Ok(position)
}
