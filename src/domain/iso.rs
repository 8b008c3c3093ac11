/// Isometric (2:1 diamond) projection, shared by everything drawn on the grid.
///
/// The camera is the player's cell and always lands on `center`.
/// Grid differences are taken in integers before scaling, so the map,
/// the player and every sprite go through identical arithmetic and
/// never drift apart by a fraction of a unit.

use super::grid::GridPos;

/// A point in screen units (pixels, or terminal cells for the TUI).
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct Projection {
    /// Screen point the camera cell is drawn at. Rounded on construction.
    pub center: ScreenPos,
    /// Full diamond width.
    pub tile_w: f32,
    /// Full diamond height (half the width for a 2:1 layout).
    pub tile_h: f32,
}

impl Projection {
    /// Projection centered in a `view_w` × `view_h` screen.
    pub fn centered(view_w: f32, view_h: f32, tile_w: f32, tile_h: f32) -> Self {
        Projection {
            center: ScreenPos { x: (view_w / 2.0).floor(), y: (view_h / 2.0).floor() },
            tile_w,
            tile_h,
        }
    }

    /// Screen position of the middle of `cell` when the camera sits on `camera`.
    #[inline]
    pub fn project(&self, cell: GridPos, camera: GridPos) -> ScreenPos {
        let dx = cell.x as i64 - camera.x as i64;
        let dy = cell.y as i64 - camera.y as i64;
        ScreenPos {
            x: self.center.x + (dx - dy) as f32 * (self.tile_w / 2.0),
            y: self.center.y + (dx + dy) as f32 * (self.tile_h / 2.0),
        }
    }

    /// Anchor for tile quads: their left vertex, half a tile left of the middle.
    #[inline]
    pub fn tile_origin(&self, cell: GridPos, camera: GridPos) -> ScreenPos {
        let mid = self.project(cell, camera);
        ScreenPos { x: mid.x - self.tile_w / 2.0, y: mid.y }
    }
}
