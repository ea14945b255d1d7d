//! Bridge between the local roster and a remote realtime store.
//!
//! The bridge owns the subscription on the session path, normalizes whatever
//! shape the store hands back into the canonical student list, bootstraps a
//! default roster when the store is empty, and pushes every local mutation
//! back out as one full-roster overwrite (last-write-wins, no merge).

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;

use crate::assign::assign_teams;
use crate::remote::{RemoteStore, Subscription};
use crate::roster::{default_students, Student};

/// Result of one remote push. Failures are logged and retained here, never
/// retried and never surfaced to the shell; the local roster simply stays
/// ahead of the remote until the next successful push.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub seq: u64,
    pub path: String,
    pub at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub pushed: u64,
    pub failed: u64,
    pub last_outcome: Option<WriteOutcome>,
}

struct BridgeInner {
    // Own writes echo back through the subscription; each successful push
    // arms one suppression so the echo is not re-applied.
    suppress_echo: u32,
    outcomes: Vec<WriteOutcome>,
    pushed: u64,
    failed: u64,
    next_seq: u64,
}

impl BridgeInner {
    fn new() -> BridgeInner {
        BridgeInner {
            suppress_echo: 0,
            outcomes: Vec::new(),
            pushed: 0,
            failed: 0,
            next_seq: 1,
        }
    }
}

/// Normalizes the remote `students` value: an array of records is used
/// as-is; a keyed object takes its values in map order (store-determined,
/// not guaranteed stable across updates); anything else is treated as
/// missing. A collection containing a malformed record is rejected whole.
pub fn normalize_students(value: &Value) -> Option<Vec<Student>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
        Value::Object(map) => map
            .values()
            .map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
        _ => None,
    }
}

fn roster_from_snapshot(snapshot: &Value) -> Option<Vec<Student>> {
    normalize_students(snapshot.get("students")?)
}

fn push_students(
    store: &Rc<dyn RemoteStore>,
    students_path: &str,
    inner: &Rc<RefCell<BridgeInner>>,
    students: &[Student],
) {
    let value = match serde_json::to_value(students) {
        Ok(v) => v,
        Err(e) => {
            record_outcome(inner, students_path, Some(e.to_string()));
            return;
        }
    };

    inner.borrow_mut().suppress_echo += 1;
    let result = store.overwrite(students_path, value);
    match result {
        Ok(()) => record_outcome(inner, students_path, None),
        Err(e) => {
            // The store never delivered our write, so there is no echo to eat.
            inner.borrow_mut().suppress_echo -= 1;
            record_outcome(inner, students_path, Some(format!("{e:#}")));
        }
    }
}

fn record_outcome(inner: &Rc<RefCell<BridgeInner>>, path: &str, error: Option<String>) {
    let mut inner = inner.borrow_mut();
    let seq = inner.next_seq;
    inner.next_seq += 1;
    match &error {
        Some(message) => {
            inner.failed += 1;
            tracing::warn!(seq, path, %message, "remote push failed, roster is ahead of remote");
        }
        None => {
            inner.pushed += 1;
            tracing::debug!(seq, path, "roster pushed");
        }
    }
    inner.outcomes.push(WriteOutcome {
        seq,
        path: path.to_string(),
        at: Utc::now().to_rfc3339(),
        error,
    });
}

pub struct SyncBridge {
    store: Rc<dyn RemoteStore>,
    students_path: String,
    roster: Rc<RefCell<Vec<Student>>>,
    inner: Rc<RefCell<BridgeInner>>,
    _sub: Subscription,
}

impl SyncBridge {
    /// Subscribes to `session_path` on the store and adopts the first
    /// snapshot. A missing or malformed snapshot triggers the read-repair
    /// bootstrap: generate the default roster, write it back, adopt it.
    ///
    /// `bootstrap_seed` pins the bootstrap shuffle for deterministic tests;
    /// production callers pass `None`.
    pub fn connect(
        store: Rc<dyn RemoteStore>,
        session_path: &str,
        bootstrap_seed: Option<u64>,
    ) -> SyncBridge {
        let students_path = format!("{}/students", session_path.trim_end_matches('/'));
        let roster: Rc<RefCell<Vec<Student>>> = Rc::new(RefCell::new(Vec::new()));
        let inner = Rc::new(RefCell::new(BridgeInner::new()));

        let cb_store = store.clone();
        let cb_roster = roster.clone();
        let cb_inner = inner.clone();
        let cb_students_path = students_path.clone();

        let sub = store.subscribe(
            session_path,
            Box::new(move |snapshot: &Value| {
                {
                    let mut inner = cb_inner.borrow_mut();
                    if inner.suppress_echo > 0 {
                        inner.suppress_echo -= 1;
                        return;
                    }
                }

                match roster_from_snapshot(snapshot) {
                    Some(students) => {
                        *cb_roster.borrow_mut() = students;
                    }
                    None => {
                        let mut rng = match bootstrap_seed {
                            Some(seed) => StdRng::seed_from_u64(seed),
                            None => StdRng::from_entropy(),
                        };
                        let students = assign_teams(&default_students(), &mut rng);
                        tracing::info!(
                            count = students.len(),
                            "no usable students snapshot, bootstrapping default roster"
                        );
                        *cb_roster.borrow_mut() = students.clone();
                        push_students(&cb_store, &cb_students_path, &cb_inner, &students);
                    }
                }
            }),
        );

        SyncBridge {
            store,
            students_path,
            roster,
            inner,
            _sub: sub,
        }
    }

    pub fn roster(&self) -> Vec<Student> {
        self.roster.borrow().clone()
    }

    /// Optimistic update: replaces the local roster with `f`'s result first,
    /// then pushes the whole roster to the remote. The push result never
    /// affects the returned roster.
    pub fn mutate<F>(&self, f: F) -> Vec<Student>
    where
        F: FnOnce(&[Student]) -> Vec<Student>,
    {
        let next = f(&self.roster.borrow());
        *self.roster.borrow_mut() = next.clone();
        push_students(&self.store, &self.students_path, &self.inner, &next);
        next
    }

    pub fn status(&self) -> SyncStatus {
        let inner = self.inner.borrow();
        SyncStatus {
            pushed: inner.pushed,
            failed: inner.failed,
            last_outcome: inner.outcomes.last().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_and_keyed_snapshots_normalize_to_the_same_roster() {
        let record = json!({"id": 1, "name": "An", "score": 2, "team": 3});
        let from_array = normalize_students(&json!([record])).expect("array form");
        let from_keyed =
            normalize_students(&json!({ "s1": record })).expect("keyed form");
        assert_eq!(from_array, from_keyed);
        assert_eq!(from_array[0].id, 1);
        assert_eq!(from_array[0].team.number(), 3);
    }

    #[test]
    fn malformed_collections_are_treated_as_missing() {
        assert!(normalize_students(&json!("nope")).is_none());
        assert!(normalize_students(&json!(42)).is_none());
        assert!(normalize_students(&Value::Null).is_none());
        // One bad record poisons the snapshot rather than silently dropping it.
        assert!(normalize_students(&json!([{"id": 1}])).is_none());
        assert!(
            normalize_students(&json!([{"id": 1, "name": "A", "score": 0, "team": 9}])).is_none()
        );
    }

    #[test]
    fn empty_array_is_an_empty_roster_not_a_bootstrap() {
        assert_eq!(normalize_students(&json!([])), Some(Vec::new()));
    }
}
