//! Round-based election loop.
//!
//! Each round submits every still-pending class once. A class leaves the
//! queue when it is elected or when retrying cannot help (time conflict,
//! bad category). Full classes and unrecognized replies stay queued for the
//! next round.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use electsys::{ElectError, ElectionOutcome};

/// Per-class result after the loop ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassReport {
    pub class_id: String,
    pub outcome: ElectionOutcome,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rounds: u32,
    pub classes: Vec<ClassReport>,
}

impl RunSummary {
    pub fn elected(&self) -> impl Iterator<Item = &ClassReport> {
        self.classes.iter().filter(|c| c.outcome.is_success())
    }
}

/// Whether a class should be submitted again next round.
fn keeps_trying(outcome: ElectionOutcome) -> bool {
    matches!(
        outcome,
        ElectionOutcome::ClassFull | ElectionOutcome::RequestRejected | ElectionOutcome::Unknown
    )
}

#[derive(Debug, Clone)]
pub struct ElectionRunner {
    /// Keep running rounds until every class is settled.
    pub until_success: bool,
    /// Upper bound on rounds. Setting it also enables repeated rounds;
    /// with neither field set the runner does a single round.
    pub max_rounds: Option<u32>,
    pub interval: Duration,
}

impl Default for ElectionRunner {
    fn default() -> Self {
        Self {
            until_success: false,
            max_rounds: None,
            interval: Duration::from_secs(1),
        }
    }
}

impl ElectionRunner {
    fn round_limit(&self) -> Option<u32> {
        if self.until_success || self.max_rounds.is_some() {
            self.max_rounds
        } else {
            Some(1)
        }
    }

    /// Run rounds over `class_ids`, calling `elect_once` per submission.
    ///
    /// An executor error aborts the loop and is returned as-is.
    pub fn run<F>(&self, class_ids: &[String], mut elect_once: F) -> Result<RunSummary, ElectError>
    where
        F: FnMut(&str) -> Result<ElectionOutcome, ElectError>,
    {
        let started_at = Utc::now();
        let mut reports: Vec<ClassReport> = class_ids
            .iter()
            .map(|id| ClassReport {
                class_id: id.clone(),
                outcome: ElectionOutcome::Unknown,
                attempts: 0,
            })
            .collect();
        let mut pending: Vec<usize> = (0..reports.len()).collect();
        let limit = self.round_limit();
        let mut rounds = 0u32;

        while !pending.is_empty() && limit.map_or(true, |max| rounds < max) {
            if rounds > 0 {
                std::thread::sleep(self.interval);
            }
            rounds += 1;
            tracing::debug!(round = rounds, pending = pending.len(), "election round");

            let mut still_pending = Vec::with_capacity(pending.len());
            for idx in pending {
                let report = &mut reports[idx];
                let outcome = elect_once(&report.class_id)?;
                report.outcome = outcome;
                report.attempts += 1;
                if keeps_trying(outcome) {
                    still_pending.push(idx);
                } else {
                    tracing::info!(class_id = %report.class_id, %outcome, attempts = report.attempts, "class settled");
                }
            }
            pending = still_pending;
        }

        Ok(RunSummary {
            started_at,
            finished_at: Utc::now(),
            rounds,
            classes: reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::collections::VecDeque;

    fn classes(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    /// Scripted outcomes per class; the last one repeats.
    fn script(
        plan: &[(&str, &[ElectionOutcome])],
    ) -> impl FnMut(&str) -> Result<ElectionOutcome, ElectError> {
        let mut queues: HashMap<String, VecDeque<ElectionOutcome>> = plan
            .iter()
            .map(|(id, outs)| (id.to_string(), outs.iter().copied().collect()))
            .collect();
        move |id: &str| {
            let q = queues.get_mut(id).expect("class in plan");
            let out = if q.len() > 1 {
                q.pop_front().unwrap()
            } else {
                *q.front().unwrap()
            };
            Ok(out)
        }
    }

    fn fast(until_success: bool, max_rounds: Option<u32>) -> ElectionRunner {
        ElectionRunner {
            until_success,
            max_rounds,
            interval: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_single_round_by_default() {
        let summary = fast(false, None)
            .run(
                &classes(&["A", "B"]),
                script(&[
                    ("A", &[ElectionOutcome::ClassFull]),
                    ("B", &[ElectionOutcome::Success]),
                ]),
            )
            .unwrap();
        assert_eq!(summary.rounds, 1);
        assert_eq!(summary.classes[0].outcome, ElectionOutcome::ClassFull);
        assert_eq!(summary.elected().count(), 1);
    }

    #[test]
    fn test_until_success_retries_full_classes() {
        use ElectionOutcome::*;
        let summary = fast(true, None)
            .run(
                &classes(&["A", "B", "C"]),
                script(&[
                    ("A", &[ClassFull, Unknown, Success]),
                    ("B", &[TimeConflict]),
                    ("C", &[Success]),
                ]),
            )
            .unwrap();
        assert_eq!(summary.rounds, 3);
        let by_id: HashMap<_, _> = summary
            .classes
            .iter()
            .map(|c| (c.class_id.as_str(), (c.outcome, c.attempts)))
            .collect();
        assert_eq!(by_id["A"], (Success, 3));
        assert_eq!(by_id["B"], (TimeConflict, 1));
        assert_eq!(by_id["C"], (Success, 1));
    }

    #[test]
    fn test_max_rounds_bounds_loop() {
        let summary = fast(true, Some(4))
            .run(
                &classes(&["A"]),
                script(&[("A", &[ElectionOutcome::ClassFull])]),
            )
            .unwrap();
        assert_eq!(summary.rounds, 4);
        assert_eq!(summary.classes[0].attempts, 4);
        assert_eq!(summary.elected().count(), 0);
    }

    #[test]
    fn test_max_rounds_alone_repeats_rounds() {
        use ElectionOutcome::*;
        let summary = fast(false, Some(3))
            .run(
                &classes(&["A", "B"]),
                script(&[("A", &[ClassFull]), ("B", &[ClassFull, Success])]),
            )
            .unwrap();
        assert_eq!(summary.rounds, 3);
        assert_eq!(summary.classes[0].attempts, 3);
        assert_eq!(summary.classes[1].outcome, Success);
        assert_eq!(summary.classes[1].attempts, 2);
    }

    #[test]
    fn test_invalid_category_is_not_retried() {
        let summary = fast(true, None)
            .run(
                &classes(&["A"]),
                script(&[("A", &[ElectionOutcome::InvalidCategory])]),
            )
            .unwrap();
        assert_eq!(summary.rounds, 1);
    }

    #[test]
    fn test_executor_error_aborts() {
        let result = fast(true, None).run(&classes(&["A"]), |_| {
            Err(ElectError::ProtocolUsage("no session".into()))
        });
        assert!(matches!(result, Err(ElectError::ProtocolUsage(_))));
    }

    #[test]
    fn test_empty_class_list() {
        let summary = fast(true, None)
            .run(&[], |_| panic!("no classes to elect"))
            .unwrap();
        assert_eq!(summary.rounds, 0);
        assert!(summary.classes.is_empty());
    }
}
