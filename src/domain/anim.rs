/// Tile transition animator.
///
/// A `TileAnimation` flickers one cell between its old and new tile id,
/// then settles on the new id:
///
///   Pending ──first tick──▶ Active ──elapsed ≥ duration──▶ Done
///
/// Every tick writes the shown id into the grid, so animations on the
/// same cell resolve last-write-wins in list order. When an instance
/// finishes, the cell is forced to `end` and the instance is dropped.
///
/// The grid therefore holds the blink frame while a cell animates. Game
/// rules ask `settles_to` for the id the cell is heading for instead.

use super::grid::{Grid, GridPos};
use super::tile::TileId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimPhase {
    Pending,
    Active,
    Done,
}

#[derive(Clone, Debug)]
pub struct TileAnimation {
    pub cell: GridPos,
    pub start: TileId,
    pub end: TileId,
    pub elapsed: f32,
    pub duration: f32,
    /// Seconds between flips of the shown id.
    pub blink: f32,
    pub phase: AnimPhase,
}

impl TileAnimation {
    /// Capture the cell's current id as the starting id.
    pub fn new(grid: &Grid, cell: GridPos, end: TileId, duration: f32, blink: f32) -> Self {
        TileAnimation {
            cell,
            start: grid.get(cell).unwrap_or(end),
            end,
            elapsed: 0.0,
            duration,
            blink,
            phase: AnimPhase::Pending,
        }
    }

    /// Id shown at the current elapsed time.
    pub fn shown(&self) -> TileId {
        if self.phase == AnimPhase::Done || self.elapsed >= self.duration {
            return self.end;
        }
        if self.blink <= 0.0 {
            return self.start;
        }
        let flips = (self.elapsed / self.blink) as u32;
        if flips % 2 == 0 { self.start } else { self.end }
    }

    /// Advance by `dt` and write the shown id. Returns true when done.
    pub fn tick(&mut self, grid: &mut Grid, dt: f32) -> bool {
        if self.phase == AnimPhase::Done {
            return true;
        }
        self.phase = AnimPhase::Active;
        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.duration {
            self.phase = AnimPhase::Done;
        }
        grid.set(self.cell, self.shown());
        self.phase == AnimPhase::Done
    }
}

/// The active set of tile animations.
#[derive(Clone, Debug, Default)]
pub struct Animator {
    active: Vec<TileAnimation>,
}

impl Animator {
    pub fn new() -> Self {
        Animator { active: Vec::new() }
    }

    pub fn push(&mut self, anim: TileAnimation) {
        tracing::debug!(
            "tile animation at {}: {} -> {} over {:.2}s",
            anim.cell, anim.start, anim.end, anim.duration
        );
        self.active.push(anim);
    }

    /// Tick every animation in order; finished ones leave the set.
    /// Returns the cells that settled this tick.
    pub fn tick(&mut self, grid: &mut Grid, dt: f32) -> Vec<GridPos> {
        let mut settled = Vec::new();
        self.active.retain_mut(|anim| {
            let done = anim.tick(grid, dt);
            if done {
                settled.push(anim.cell);
            }
            !done
        });
        settled
    }

    /// Id the cell will hold once its animations finish, if any are
    /// running on it. The last one pushed wins, as it does in `tick`.
    pub fn settles_to(&self, cell: GridPos) -> Option<TileId> {
        self.active.iter().rev().find(|a| a.cell == cell).map(|a| a.end)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileAnimation> {
        self.active.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(cell: GridPos, id: TileId) -> Grid {
        let mut g = Grid::new(4, 4);
        g.set(cell, id);
        g
    }

    #[test]
    fn captures_start_from_grid() {
        let cell = GridPos::new(2, 1);
        let g = grid_with(cell, 5);
        let a = TileAnimation::new(&g, cell, 0, 1.0, 0.08);
        assert_eq!(a.start, 5);
        assert_eq!(a.phase, AnimPhase::Pending);
    }

    #[test]
    fn flickers_then_settles() {
        let cell = GridPos::new(1, 1);
        let mut g = grid_with(cell, 5);
        let mut a = TileAnimation::new(&g, cell, 0, 1.0, 0.1);

        assert!(!a.tick(&mut g, 0.05)); // 0.05: first half-interval
        assert_eq!(a.phase, AnimPhase::Active);
        assert_eq!(g.get(cell), Some(5));
        assert!(!a.tick(&mut g, 0.1)); // 0.15: flipped once
        assert_eq!(g.get(cell), Some(0));
        assert!(!a.tick(&mut g, 0.1)); // 0.25: flipped twice
        assert_eq!(g.get(cell), Some(5));
        assert!(a.tick(&mut g, 0.8)); // 1.05: done
        assert_eq!(a.phase, AnimPhase::Done);
        assert_eq!(g.get(cell), Some(0));
    }

    #[test]
    fn always_ends_on_end_id() {
        // Whatever the frame pacing, the cell settles on `end`.
        for dt in [0.016_f32, 0.05, 0.08, 0.333, 2.5] {
            let cell = GridPos::new(0, 3);
            let mut g = grid_with(cell, 7);
            let mut anim = Animator::new();
            anim.push(TileAnimation::new(&g, cell, 1, 1.0, 0.08));
            let mut ticks = 0;
            while !anim.is_empty() {
                anim.tick(&mut g, dt);
                ticks += 1;
                assert!(ticks < 1000);
            }
            assert_eq!(g.get(cell), Some(1), "dt = {dt}");
        }
    }

    #[test]
    fn same_cell_last_write_wins() {
        let cell = GridPos::new(3, 3);
        let mut g = grid_with(cell, 2);
        let mut anim = Animator::new();
        anim.push(TileAnimation::new(&g, cell, 4, 1.0, 0.08));
        anim.push(TileAnimation::new(&g, cell, 6, 1.0, 0.08));
        let settled = anim.tick(&mut g, 1.5);
        assert_eq!(settled, vec![cell, cell]);
        assert_eq!(g.get(cell), Some(6));
    }

    #[test]
    fn settles_to_reports_the_final_id_mid_blink() {
        let cell = GridPos::new(2, 2);
        let mut g = grid_with(cell, 3);
        let mut anim = Animator::new();
        assert_eq!(anim.settles_to(cell), None);
        anim.push(TileAnimation::new(&g, cell, 1, 1.0, 0.08));
        anim.push(TileAnimation::new(&g, cell, 4, 1.0, 0.08));
        anim.tick(&mut g, 0.01);
        assert_eq!(g.get(cell), Some(3));
        assert_eq!(anim.settles_to(cell), Some(4));
        assert_eq!(anim.settles_to(GridPos::new(0, 0)), None);
    }

    #[test]
    fn independent_cells_do_not_interact() {
        let a = GridPos::new(0, 0);
        let b = GridPos::new(3, 0);
        let mut g = Grid::new(4, 4);
        let mut anim = Animator::new();
        anim.push(TileAnimation::new(&g, a, 1, 0.5, 0.08));
        anim.push(TileAnimation::new(&g, b, 2, 2.0, 0.08));
        assert_eq!(anim.tick(&mut g, 0.6), vec![a]);
        assert_eq!(anim.len(), 1);
        assert_eq!(g.get(a), Some(1));
        anim.tick(&mut g, 2.0);
        assert_eq!(g.get(b), Some(2));
        assert!(anim.is_empty());
    }
}
