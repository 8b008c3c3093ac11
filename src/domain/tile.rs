/// Tile ids and what they look like.
/// The map file stores raw ids; semantics live here so the
/// renderer and the rules never disagree about what an id means.

/// Raw tile id as stored in the map file (index into the tileset).
pub type TileId = u32;

pub const GRASS: TileId = 0;
pub const PATH: TileId = 1;
pub const ROCK: TileId = 2;
pub const LAVA: TileId = 3;
pub const WATER: TileId = 4;
pub const GATE: TileId = 5;
pub const PORTAL: TileId = 6;
/// Turned soil left where a coin was picked up.
pub const DUG: TileId = 7;

/// Number of tiles in the tileset. Ids at or above this draw as `Unknown`.
pub const TILESET_LEN: TileId = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileKind {
    Grass,
    Path,
    Rock,
    Lava,
    Water,
    Gate,
    Portal,
    Dug,
    Unknown,
}

impl TileKind {
    pub fn from_id(id: TileId) -> Self {
        match id {
            GRASS => TileKind::Grass,
            PATH => TileKind::Path,
            ROCK => TileKind::Rock,
            LAVA => TileKind::Lava,
            WATER => TileKind::Water,
            GATE => TileKind::Gate,
            PORTAL => TileKind::Portal,
            DUG => TileKind::Dug,
            _ => TileKind::Unknown,
        }
    }

    /// Tiles that hurt when stepped on. Walkability is decided by the
    /// barrier grid, never by the tile id.
    pub fn is_hazard(self) -> bool {
        matches!(self, TileKind::Lava)
    }
}
