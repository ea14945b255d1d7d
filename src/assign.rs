use rand::seq::SliceRandom;
use rand::Rng;

use crate::roster::{Student, Team};

/// Shuffles the roster and deals teams round-robin over the shuffled order.
///
/// The incoming team fields are ignored. The partition is balanced for any N:
/// floor(N/4) <= |team| <= ceil(N/4). (The pre-rewrite behavior assigned
/// contiguous chunks of 13 shuffled entries per team, which wrapped unevenly
/// past 52 students; see DESIGN.md.)
pub fn assign_teams<R: Rng>(students: &[Student], rng: &mut R) -> Vec<Student> {
    let mut shuffled: Vec<Student> = students.to_vec();
    shuffled.shuffle(rng);
    for (index, student) in shuffled.iter_mut().enumerate() {
        student.team = Team::from_partition_index(index);
    }
    shuffled
}
