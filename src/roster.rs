use serde::{Deserialize, Serialize};

pub const TEAM_COUNT: u8 = 4;

/// Seating/scoring group, always one of 1..=4.
///
/// The range check lives in the type so a roster can never hold an
/// out-of-range team, whether it came from the IPC boundary or from a
/// remote snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Team(u8);

impl Team {
    pub fn new(n: i64) -> Option<Team> {
        if (1..=TEAM_COUNT as i64).contains(&n) {
            Some(Team(n as u8))
        } else {
            None
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Team> {
        (1..=TEAM_COUNT).map(Team)
    }

    /// Round-robin partition over a shuffled order.
    pub(crate) fn from_partition_index(index: usize) -> Team {
        Team((index % TEAM_COUNT as usize) as u8 + 1)
    }
}

impl TryFrom<u8> for Team {
    type Error = String;

    fn try_from(n: u8) -> Result<Team, String> {
        Team::new(n as i64).ok_or_else(|| format!("team must be 1..={}, got {}", TEAM_COUNT, n))
    }
}

impl From<Team> for u8 {
    fn from(t: Team) -> u8 {
        t.0
    }
}

/// One roster entry. `id` is the only stable identity; everything else is
/// free-form mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub score: i64,
    pub team: Team,
}

pub const DEFAULT_ROSTER_SIZE: i64 = 45;

/// The fixed fallback roster used when the remote store has no students yet.
/// Teams here are placeholders; callers run team assignment before adopting it.
pub fn default_students() -> Vec<Student> {
    (1..=DEFAULT_ROSTER_SIZE)
        .map(|id| Student {
            id,
            name: format!("Student {:02}", id),
            score: 0,
            team: Team(1),
        })
        .collect()
}

/// Adds `delta` to the matching student's score. Unknown id leaves every
/// record untouched.
pub fn change_score(students: &[Student], id: i64, delta: i64) -> Vec<Student> {
    students
        .iter()
        .map(|s| {
            if s.id == id {
                Student {
                    score: s.score + delta,
                    ..s.clone()
                }
            } else {
                s.clone()
            }
        })
        .collect()
}

/// Zeroes every score. Names and teams are untouched.
pub fn reset_scores(students: &[Student]) -> Vec<Student> {
    students
        .iter()
        .map(|s| Student {
            score: 0,
            ..s.clone()
        })
        .collect()
}

pub fn update_name(students: &[Student], id: i64, name: &str) -> Vec<Student> {
    students
        .iter()
        .map(|s| {
            if s.id == id {
                Student {
                    name: name.to_string(),
                    ..s.clone()
                }
            } else {
                s.clone()
            }
        })
        .collect()
}

/// Resets each student's name to the default entry with the same id.
/// Students without a default counterpart keep their current name; scores
/// and teams stay put.
pub fn restore_names(students: &[Student], defaults: &[Student]) -> Vec<Student> {
    students
        .iter()
        .map(|s| match defaults.iter().find(|d| d.id == s.id) {
            Some(d) => Student {
                name: d.name.clone(),
                ..s.clone()
            },
            None => s.clone(),
        })
        .collect()
}

/// Exchanges only the team fields of the two students; name and score stay
/// with their original owner. No-op unless both ids are present.
pub fn swap_teams(students: &[Student], a: i64, b: i64) -> Vec<Student> {
    let team_a = students.iter().find(|s| s.id == a).map(|s| s.team);
    let team_b = students.iter().find(|s| s.id == b).map(|s| s.team);
    let (Some(team_a), Some(team_b)) = (team_a, team_b) else {
        return students.to_vec();
    };

    students
        .iter()
        .map(|s| {
            if s.id == a {
                Student {
                    team: team_b,
                    ..s.clone()
                }
            } else if s.id == b {
                Student {
                    team: team_a,
                    ..s.clone()
                }
            } else {
                s.clone()
            }
        })
        .collect()
}

pub fn move_to_team(students: &[Student], id: i64, team: Team) -> Vec<Student> {
    students
        .iter()
        .map(|s| {
            if s.id == id {
                Student { team, ..s.clone() }
            } else {
                s.clone()
            }
        })
        .collect()
}
