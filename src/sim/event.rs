/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and log lines.

use crate::domain::grid::GridPos;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Stepped { to: GridPos },
    Bumped { at: GridPos },
    CoinCollected { at: GridPos, score: u32 },
    LifeLost { at: GridPos, lives: u32 },
    TriggerFired { name: String, target: GridPos },
    TileSettled { at: GridPos },
    Paused,
    Resumed,
    Won,
    Lost,
}
