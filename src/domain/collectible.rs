/// Coins: fixed positions, each with its own active latch.
///
/// A coin is hidden, live or taken. Hidden coins can be revealed by a
/// trigger; taken coins stay taken until the run resets.

use super::grid::GridPos;

#[derive(Clone, Debug)]
pub struct Coin {
    pub pos: GridPos,
    pub active: bool,
    collected: bool,
    initially_active: bool,
}

impl Coin {
    pub fn new(pos: GridPos, active: bool) -> Self {
        Coin { pos, active, collected: false, initially_active: active }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CoinRegistry {
    coins: Vec<Coin>,
}

impl CoinRegistry {
    pub fn new(coins: Vec<Coin>) -> Self {
        CoinRegistry { coins }
    }

    /// Deactivate the first active coin at `pos`. Returns its index,
    /// or `None` if there is nothing to pick up (already collected included).
    pub fn try_collect(&mut self, pos: GridPos) -> Option<usize> {
        let idx = self.coins.iter().position(|c| c.active && c.pos == pos)?;
        self.coins[idx].active = false;
        self.coins[idx].collected = true;
        Some(idx)
    }

    /// Turn on the first hidden coin at `pos`. Returns false when there
    /// is none (no coin there, already live, or already taken).
    pub fn activate(&mut self, pos: GridPos) -> bool {
        match self.coins.iter_mut().find(|c| c.pos == pos && !c.active && !c.collected) {
            Some(coin) => {
                coin.active = true;
                true
            }
            None => false,
        }
    }

    /// Put every coin back in its starting state.
    pub fn reset(&mut self) {
        for c in &mut self.coins {
            c.active = c.initially_active;
            c.collected = false;
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter().filter(|c| c.active)
    }

    pub fn remaining(&self) -> usize {
        self.active().count()
    }

    pub fn collected(&self) -> usize {
        self.coins.iter().filter(|c| c.collected).count()
    }

    /// Coins that are, or were, up for grabs this run. Hidden coins
    /// count once revealed.
    pub fn total(&self) -> usize {
        self.coins.iter().filter(|c| c.active || c.collected).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CoinRegistry {
        CoinRegistry::new(vec![
            Coin::new(GridPos::new(4, 0), false),
            Coin::new(GridPos::new(6, 2), true),
            Coin::new(GridPos::new(7, 13), true),
        ])
    }

    #[test]
    fn collect_is_idempotent() {
        let mut r = registry();
        assert_eq!(r.try_collect(GridPos::new(6, 2)), Some(1));
        assert_eq!(r.try_collect(GridPos::new(6, 2)), None);
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn inactive_coins_are_inert() {
        let mut r = registry();
        assert_eq!(r.try_collect(GridPos::new(4, 0)), None);
        assert_eq!(r.total(), 2);
        assert!(r.active().all(|c| c.pos != GridPos::new(4, 0)));
    }

    #[test]
    fn reset_restores_initial_flags() {
        let mut r = registry();
        r.try_collect(GridPos::new(6, 2));
        r.try_collect(GridPos::new(7, 13));
        assert_eq!(r.remaining(), 0);
        r.reset();
        assert_eq!(r.remaining(), 2);
        assert_eq!(r.try_collect(GridPos::new(4, 0)), None);
    }

    #[test]
    fn revealed_coin_can_be_taken_once() {
        let mut r = registry();
        let hidden = GridPos::new(4, 0);
        assert!(r.activate(hidden));
        assert!(!r.activate(hidden));
        assert_eq!(r.total(), 3);
        assert_eq!(r.try_collect(hidden), Some(0));
        assert!(!r.activate(hidden));
        assert_eq!(r.collected(), 1);
        assert_eq!(r.total(), 3);

        r.reset();
        assert_eq!(r.collected(), 0);
        assert_eq!(r.total(), 2);
        assert_eq!(r.try_collect(hidden), None);
    }

    #[test]
    fn activate_ignores_empty_cells() {
        let mut r = registry();
        assert!(!r.activate(GridPos::new(9, 9)));
        assert!(!r.activate(GridPos::new(6, 2)));
        assert_eq!(r.remaining(), 2);
    }
}
