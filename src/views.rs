//! Derived views over the roster. Everything here is recomputed from the
//! current student list; nothing is persisted.

use std::collections::BTreeMap;

use crate::roster::{Student, Team};

pub const LATE_LEADERBOARD_CAP: usize = 10;
pub const IMPROVEMENT_LEADERBOARD_CAP: usize = 5;

/// Students in the red, worst first. Zero scores never appear.
pub fn late_leaderboard(students: &[Student]) -> Vec<Student> {
    let mut late: Vec<Student> = students.iter().filter(|s| s.score < 0).cloned().collect();
    late.sort_by_key(|s| s.score);
    late.truncate(LATE_LEADERBOARD_CAP);
    late
}

/// Students with positive scores, best first. Zero scores never appear.
pub fn improvement_leaderboard(students: &[Student]) -> Vec<Student> {
    let mut improving: Vec<Student> = students.iter().filter(|s| s.score > 0).cloned().collect();
    improving.sort_by_key(|s| std::cmp::Reverse(s.score));
    improving.truncate(IMPROVEMENT_LEADERBOARD_CAP);
    improving
}

/// Sum of scores per team. Every team is present, empty teams total 0.
pub fn team_totals(students: &[Student]) -> BTreeMap<Team, i64> {
    let mut totals: BTreeMap<Team, i64> = Team::all().map(|t| (t, 0)).collect();
    for s in students {
        *totals.entry(s.team).or_insert(0) += s.score;
    }
    totals
}

/// Roster grouped by team, preserving roster order within each group. The
/// seating-chart shell pairs these into desks; pairing is presentation-only.
pub fn team_groups(students: &[Student]) -> BTreeMap<Team, Vec<Student>> {
    let mut groups: BTreeMap<Team, Vec<Student>> = Team::all().map(|t| (t, Vec::new())).collect();
    for s in students {
        groups.entry(s.team).or_default().push(s.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, score: i64, team: i64) -> Student {
        Student {
            id,
            name: format!("S{}", id),
            score,
            team: Team::new(team).expect("test team"),
        }
    }

    #[test]
    fn zero_scores_appear_in_neither_leaderboard() {
        let roster = vec![student(1, 0, 1), student(2, -1, 2), student(3, 4, 3)];
        assert_eq!(
            late_leaderboard(&roster).iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![2]
        );
        assert_eq!(
            improvement_leaderboard(&roster)
                .iter()
                .map(|s| s.id)
                .collect::<Vec<_>>(),
            vec![3]
        );
    }

    #[test]
    fn late_board_sorts_ascending_and_caps_at_ten() {
        let roster: Vec<Student> = (1..=14).map(|i| student(i, -i, 1)).collect();
        let board = late_leaderboard(&roster);
        assert_eq!(board.len(), 10);
        assert_eq!(board[0].score, -14);
        assert!(board.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn improvement_board_sorts_descending_and_caps_at_five() {
        let roster: Vec<Student> = (1..=8).map(|i| student(i, i, 1)).collect();
        let board = improvement_leaderboard(&roster);
        assert_eq!(board.len(), 5);
        assert_eq!(board[0].score, 8);
        assert!(board.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn totals_cover_all_teams_including_empty_ones() {
        let roster = vec![student(1, 3, 1), student(2, -1, 1), student(3, 2, 4)];
        let totals = team_totals(&roster);
        assert_eq!(totals.len(), 4);
        assert_eq!(totals[&Team::new(1).unwrap()], 2);
        assert_eq!(totals[&Team::new(2).unwrap()], 0);
        assert_eq!(totals[&Team::new(3).unwrap()], 0);
        assert_eq!(totals[&Team::new(4).unwrap()], 2);
    }

    #[test]
    fn groups_preserve_roster_order() {
        let roster = vec![student(3, 0, 2), student(1, 0, 2), student(2, 0, 1)];
        let groups = team_groups(&roster);
        let team2: Vec<i64> = groups[&Team::new(2).unwrap()].iter().map(|s| s.id).collect();
        assert_eq!(team2, vec![3, 1]);
    }
}
