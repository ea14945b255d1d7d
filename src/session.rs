//! One classroom session: the sync bridge plus the mutation surface the IPC
//! handlers call. Constructed explicitly and handed around; there is no
//! module-level singleton.

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assign::assign_teams;
use crate::remote::RemoteStore;
use crate::roster::{self, default_students, Student, Team};
use crate::sync::{SyncBridge, SyncStatus};

pub struct Session {
    bridge: SyncBridge,
    defaults: Vec<Student>,
}

impl Session {
    pub fn open(
        store: Rc<dyn RemoteStore>,
        session_path: &str,
        bootstrap_seed: Option<u64>,
    ) -> Session {
        Session {
            bridge: SyncBridge::connect(store, session_path, bootstrap_seed),
            defaults: default_students(),
        }
    }

    pub fn roster(&self) -> Vec<Student> {
        self.bridge.roster()
    }

    pub fn change_score(&self, id: i64, delta: i64) -> Vec<Student> {
        self.bridge.mutate(|r| roster::change_score(r, id, delta))
    }

    pub fn reset_scores(&self) -> Vec<Student> {
        self.bridge.mutate(roster::reset_scores)
    }

    pub fn update_name(&self, id: i64, name: &str) -> Vec<Student> {
        self.bridge.mutate(|r| roster::update_name(r, id, name))
    }

    pub fn restore_original_names(&self) -> Vec<Student> {
        let defaults = &self.defaults;
        self.bridge.mutate(|r| roster::restore_names(r, defaults))
    }

    pub fn swap_teams(&self, a: i64, b: i64) -> Vec<Student> {
        self.bridge.mutate(|r| roster::swap_teams(r, a, b))
    }

    pub fn move_to_team(&self, id: i64, team: Team) -> Vec<Student> {
        self.bridge.mutate(|r| roster::move_to_team(r, id, team))
    }

    /// Reassigns everyone to a fresh random team; names and scores ride
    /// along. `seed` pins the shuffle for deterministic shells and tests.
    pub fn reshuffle(&self, seed: Option<u64>) -> Vec<Student> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.bridge.mutate(|r| assign_teams(r, &mut rng))
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.bridge.status()
    }
}
