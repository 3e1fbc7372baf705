// src/schedule.rs
//
// Checkpoint schedule for a training run.
//
// Documents may write the schedule either as an explicit integer
// sequence or as a `range(start, stop[, step])` expression. The
// expression form is expanded at load time, so consumers only ever see
// the concrete iteration list, and the schedule always serializes back
// as a plain sequence.

use serde::{Deserialize, Serialize};

/// Iterations at which a checkpoint is persisted.
///
/// Ordering (strictly increasing) and the upper bound against the
/// iteration budget are enforced by record validation, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleRepr", into = "Vec<u64>")]
pub struct SaveSchedule {
    iterations: Vec<u64>,
}

/// Accepted document forms for a schedule.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScheduleRepr {
    List(Vec<u64>),
    RangeExpr(String),
}

impl TryFrom<ScheduleRepr> for SaveSchedule {
    type Error = String;

    fn try_from(repr: ScheduleRepr) -> Result<Self, Self::Error> {
        let iterations = match repr {
            ScheduleRepr::List(v) => v,
            ScheduleRepr::RangeExpr(expr) => expand_range_expr(&expr)?,
        };
        Ok(Self { iterations })
    }
}

impl From<SaveSchedule> for Vec<u64> {
    fn from(s: SaveSchedule) -> Self {
        s.iterations
    }
}

impl SaveSchedule {
    pub fn from_iterations(iterations: Vec<u64>) -> Self {
        Self { iterations }
    }

    /// The concrete iteration list.
    pub fn iterations(&self) -> &[u64] {
        &self.iterations
    }

    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    /// An empty schedule is legal: the run persists no checkpoints.
    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn contains(&self, iteration: u64) -> bool {
        self.iterations.contains(&iteration)
    }

    pub fn last(&self) -> Option<u64> {
        self.iterations.last().copied()
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.iterations.windows(2).all(|w| w[0] < w[1])
    }
}

/// Largest iteration list a range expression may expand to. The count
/// is checked before anything is allocated.
const MAX_EXPANDED_LEN: u64 = 1_000_000;

/// Expand a `range(start, stop[, step])` expression into the concrete
/// iteration list. Half-open: `stop` itself is never included. `step`
/// defaults to 1 and must be >= 1. Expansions longer than
/// `MAX_EXPANDED_LEN` entries are rejected.
pub fn expand_range_expr(expr: &str) -> Result<Vec<u64>, String> {
    let inner = expr
        .trim()
        .strip_prefix("range(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| format!("expected 'range(start, stop[, step])', got '{}'", expr))?;

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!(
            "range expression takes 2 or 3 arguments, got {} in '{}'",
            parts.len(),
            expr
        ));
    }

    let parse_arg = |name: &str, raw: &str| -> Result<u64, String> {
        raw.parse::<u64>()
            .map_err(|_| format!("range {} must be a non-negative integer, got '{}'", name, raw))
    };

    let start = parse_arg("start", parts[0])?;
    let stop = parse_arg("stop", parts[1])?;
    let step = match parts.get(2) {
        Some(raw) => parse_arg("step", raw)?,
        None => 1,
    };
    if step == 0 {
        return Err("range step must be >= 1".to_string());
    }
    if start < stop {
        // stop > start and step >= 1, so neither line can wrap.
        let count = (stop - start - 1) / step + 1;
        if count > MAX_EXPANDED_LEN {
            return Err(format!(
                "'{}' would expand to {} entries (limit {})",
                expr, count, MAX_EXPANDED_LEN
            ));
        }
    }

    let mut out = Vec::new();
    let mut v = start;
    while v < stop {
        out.push(v);
        v = match v.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_basic() {
        assert_eq!(expand_range_expr("range(0, 5)").unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_expand_with_step() {
        assert_eq!(
            expand_range_expr("range(0, 100001, 20000)").unwrap(),
            vec![0, 20000, 40000, 60000, 80000, 100000]
        );
    }

    #[test]
    fn test_expand_half_open() {
        // stop is excluded even when it lands on the step grid
        assert_eq!(expand_range_expr("range(0, 10, 5)").unwrap(), vec![0, 5]);
    }

    #[test]
    fn test_expand_empty() {
        assert_eq!(expand_range_expr("range(5, 5)").unwrap(), Vec::<u64>::new());
        assert_eq!(expand_range_expr("range(7, 3)").unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn test_expand_rejects_zero_step() {
        assert!(expand_range_expr("range(0, 10, 0)").is_err());
    }

    #[test]
    fn test_expand_rejects_oversized_expansion() {
        // Refused up front; nothing is allocated for a runaway stop.
        let err = expand_range_expr("range(0, 50000000)").unwrap_err();
        assert!(err.contains("range(0, 50000000)"));
        assert!(expand_range_expr("range(0, 18446744073709551615)").is_err());
    }

    #[test]
    fn test_expand_cap_counts_entries_not_span() {
        let expanded =
            expand_range_expr("range(0, 18446744073709551615, 18446744073709551614)").unwrap();
        assert_eq!(expanded, vec![0, 18446744073709551614]);
    }

    #[test]
    fn test_expand_rejects_malformed() {
        assert!(expand_range_expr("range(0)").is_err());
        assert!(expand_range_expr("range(0, 1, 2, 3)").is_err());
        assert!(expand_range_expr("range(a, b)").is_err());
        assert!(expand_range_expr("span(0, 10)").is_err());
        assert!(expand_range_expr("range(0, 10").is_err());
    }

    #[test]
    fn test_deserialize_list_form() {
        let schedule: SaveSchedule = serde_yaml::from_str("[0, 100000]").unwrap();
        assert_eq!(schedule.iterations(), &[0, 100000]);
    }

    #[test]
    fn test_deserialize_range_form() {
        let schedule: SaveSchedule = serde_yaml::from_str("\"range(0, 30, 10)\"").unwrap();
        assert_eq!(schedule.iterations(), &[0, 10, 20]);
    }

    #[test]
    fn test_range_form_serializes_as_list() {
        let schedule: SaveSchedule = serde_yaml::from_str("\"range(0, 30, 10)\"").unwrap();
        let yaml = serde_yaml::to_string(&schedule).unwrap();
        let back: SaveSchedule = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(schedule, back);
        assert!(!yaml.contains("range"));
    }

    #[test]
    fn test_deserialize_bad_range_expr_fails() {
        let result: Result<SaveSchedule, _> = serde_yaml::from_str("\"range(0, 10, 0)\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_ordering_helpers() {
        let ordered = SaveSchedule::from_iterations(vec![0, 10, 20]);
        assert!(ordered.is_strictly_increasing());
        assert!(ordered.contains(10));
        assert!(!ordered.contains(15));
        assert_eq!(ordered.last(), Some(20));

        let unordered = SaveSchedule::from_iterations(vec![0, 10, 10]);
        assert!(!unordered.is_strictly_increasing());

        assert!(SaveSchedule::default().is_strictly_increasing());
        assert!(SaveSchedule::default().is_empty());
    }
}
