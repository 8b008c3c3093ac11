/// Draw list: what a front end should paint this frame, back to front.
///
/// Layers go tiles → coins → effects → player. Tiles are emitted row by
/// row (y, then x), which is the painter's order for a 2:1 diamond map
/// seen from the south. Every position comes from the same `Projection`
/// with the player's cell as the camera.

use crate::domain::grid::GridPos;
use crate::domain::iso::{Projection, ScreenPos};
use crate::domain::tile::TileId;
use super::world::GameState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Layer {
    Tile(TileId),
    Coin,
    Effect,
    Player,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DrawCmd {
    pub layer: Layer,
    pub cell: GridPos,
    /// Tiles: left vertex of the diamond. Sprites: cell middle.
    pub pos: ScreenPos,
    /// Sprite sheet (column, row). Player: (walk frame, facing row).
    pub region: (u32, u32),
    pub flip_x: bool,
    /// Effects grow as they fade: 1.0 → 2.0.
    pub scale: f32,
}

impl DrawCmd {
    fn sprite(layer: Layer, cell: GridPos, pos: ScreenPos) -> Self {
        DrawCmd { layer, cell, pos, region: (0, 0), flip_x: false, scale: 1.0 }
    }
}

pub fn build_draw_list(state: &GameState, proj: &Projection) -> Vec<DrawCmd> {
    let camera = state.player.pos;
    let mut list = Vec::with_capacity(state.tiles.width() * state.tiles.height() + 8);

    for (cell, id) in state.tiles.iter() {
        list.push(DrawCmd {
            layer: Layer::Tile(id),
            cell,
            pos: proj.tile_origin(cell, camera),
            region: (id, 0),
            flip_x: false,
            scale: 1.0,
        });
    }

    for coin in state.coins.active() {
        list.push(DrawCmd::sprite(Layer::Coin, coin.pos, proj.project(coin.pos, camera)));
    }

    for effect in &state.effects {
        let mut cmd = DrawCmd::sprite(Layer::Effect, effect.pos, proj.project(effect.pos, camera));
        cmd.scale = 1.0 + effect.progress();
        list.push(cmd);
    }

    let player = &state.player;
    list.push(DrawCmd {
        layer: Layer::Player,
        cell: player.pos,
        pos: proj.project(player.pos, camera),
        region: (player.frame, player.facing.sprite_row()),
        flip_x: player.facing.faces_left(),
        scale: 1.0,
    });

    list
}
