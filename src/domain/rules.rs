/// Movement rules: pure functions, no side effects.
///
/// ## Step resolution
///
/// ┌─────────────────────────────────┬────────────────────────────┐
/// │ Condition (per axis)            │ Result                     │
/// ├─────────────────────────────────┼────────────────────────────┤
/// │ delta −1 and coord == 0         │ axis unchanged (clamped)   │
/// │ delta +1 and coord == size − 1  │ axis unchanged (clamped)   │
/// │ otherwise                       │ axis += delta              │
/// └─────────────────────────────────┴────────────────────────────┘
///
/// Then, on the candidate cell:
///
/// ┌─────────────────────────────────┬────────────────────────────┐
/// │ Candidate                       │ Outcome                    │
/// ├─────────────────────────────────┼────────────────────────────┤
/// │ equals current (both clamped)   │ Stayed                     │
/// │ barrier non-zero                │ Blocked, position kept     │
/// │ otherwise                       │ Moved                      │
/// └─────────────────────────────────┴────────────────────────────┘
///
/// Facing is not decided here: the caller turns the player on every
/// press, whether or not the step goes through.

use super::entity::Direction;
use super::grid::{Grid, GridPos};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Moved(GridPos),
    /// The candidate cell holds a barrier.
    Blocked(GridPos),
    /// Every axis was clamped at the edge.
    Stayed,
}

impl MoveOutcome {
    /// Position after the move, given where the player started.
    pub fn resolve(self, from: GridPos) -> GridPos {
        match self {
            MoveOutcome::Moved(to) => to,
            MoveOutcome::Blocked(_) | MoveOutcome::Stayed => from,
        }
    }
}

/// Apply one axis delta with edge clamping.
#[inline]
fn step_axis(coord: usize, delta: i32, size: usize) -> usize {
    match delta {
        d if d < 0 && coord > 0 => coord - 1,
        d if d > 0 && coord + 2 <= size => coord + 1,
        _ => coord,
    }
}

/// Candidate cell for a step, before collision.
pub fn clamp_step(from: GridPos, dir: Direction, width: usize, height: usize) -> GridPos {
    let (dx, dy) = dir.delta();
    GridPos::new(step_axis(from.x, dx, width), step_axis(from.y, dy, height))
}

/// Resolve a step against the barrier grid. See tables above.
pub fn attempt_move(barriers: &Grid, from: GridPos, dir: Direction) -> MoveOutcome {
    let to = clamp_step(from, dir, barriers.width(), barriers.height());
    if to == from {
        return MoveOutcome::Stayed;
    }
    if !barriers.is_open(to) {
        return MoveOutcome::Blocked(to);
    }
    MoveOutcome::Moved(to)
}
