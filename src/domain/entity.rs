/// Entities: the player and short-lived effect sprites.

use super::grid::GridPos;

/// Eight walking directions. The discriminant is the sprite-sheet row.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    North = 0,
    NorthWest = 1,
    West = 2,
    SouthWest = 3,
    South = 4,
    SouthEast = 5,
    East = 6,
    NorthEast = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
        Direction::East,
        Direction::NorthEast,
    ];

    /// Grid delta. On screen North is straight up: both axes shrink.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (-1, -1),
            Direction::NorthWest => (-1, 0),
            Direction::West => (-1, 1),
            Direction::SouthWest => (0, 1),
            Direction::South => (1, 1),
            Direction::SouthEast => (1, 0),
            Direction::East => (1, -1),
            Direction::NorthEast => (0, -1),
        }
    }

    pub fn sprite_row(self) -> u32 {
        self as u32
    }

    /// Does the sprite face left on screen?
    pub fn faces_left(self) -> bool {
        matches!(self, Direction::NorthWest | Direction::West | Direction::SouthWest)
    }
}

/// Per-frame gameplay input. Movement is edge-triggered: one step per press.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<Direction>,
    pub toggle_pause: bool,
}

pub const WALK_FRAMES: u32 = 4;

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: GridPos,
    pub facing: Direction,
    /// Set on every movement key press, even if the step was refused.
    pub moving: bool,
    pub frame: u32,
    frame_timer: f32,
    idle_timer: f32,
}

impl Player {
    pub fn new(pos: GridPos) -> Self {
        Player {
            pos,
            facing: Direction::SouthWest,
            moving: false,
            frame: 0,
            frame_timer: 0.0,
            idle_timer: 0.0,
        }
    }

    /// Register a movement key press.
    pub fn face(&mut self, dir: Direction) {
        self.facing = dir;
        self.moving = true;
        self.idle_timer = 0.0;
    }

    /// Advance the walk cycle. While moving, frames step at `fps`;
    /// after `idle_after` seconds without a press the player stands still.
    pub fn animate(&mut self, dt: f32, fps: f32, idle_after: f32) {
        if !self.moving {
            return;
        }
        self.idle_timer += dt;
        if self.idle_timer >= idle_after {
            self.moving = false;
            self.frame = 0;
            self.frame_timer = 0.0;
            return;
        }
        if fps <= 0.0 {
            return;
        }
        self.frame_timer += dt;
        let step = 1.0 / fps;
        while self.frame_timer >= step {
            self.frame_timer -= step;
            self.frame = (self.frame + 1) % WALK_FRAMES;
        }
    }
}

/// One-shot sprite drawn over a cell for a short time (lava splash).
#[derive(Clone, Debug)]
pub struct Effect {
    pub pos: GridPos,
    pub remaining: f32,
    total: f32,
}

impl Effect {
    pub fn new(pos: GridPos, duration: f32) -> Self {
        Effect { pos, remaining: duration, total: duration }
    }

    /// Advance by `dt`. Returns true once the effect has expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }

    /// 0.0 when spawned, 1.0 when about to vanish.
    pub fn progress(&self) -> f32 {
        if self.total <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining / self.total).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_discriminants() {
        for (i, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.sprite_row(), i as u32);
        }
    }

    #[test]
    fn screen_diagonals_walk_along_one_grid_axis() {
        assert_eq!(Direction::NorthWest.delta(), (-1, 0));
        assert_eq!(Direction::NorthEast.delta(), (0, -1));
        assert_eq!(Direction::North.delta(), (-1, -1));
        assert_eq!(Direction::East.delta(), (1, -1));
    }

    #[test]
    fn walk_cycle_wraps_then_idles() {
        let mut p = Player::new(GridPos::new(0, 0));
        p.face(Direction::South);
        p.animate(0.3, 12.0, 1.0); // 3 frames at 12 fps
        assert_eq!(p.frame, 3);
        p.animate(0.1, 12.0, 1.0);
        assert_eq!(p.frame, 0); // wrapped
        p.animate(1.0, 12.0, 1.0);
        assert!(!p.moving);
        assert_eq!(p.frame, 0);
    }

    #[test]
    fn standing_player_does_not_animate() {
        let mut p = Player::new(GridPos::new(0, 0));
        p.animate(5.0, 12.0, 0.5);
        assert_eq!(p.frame, 0);
    }

    #[test]
    fn effect_lifecycle() {
        let mut e = Effect::new(GridPos::new(1, 1), 0.5);
        assert!(!e.tick(0.25));
        assert!((e.progress() - 0.5).abs() < 1e-6);
        assert!(e.tick(0.25));
    }
}
