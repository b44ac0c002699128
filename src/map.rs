use log::trace;

use crate::inventory::Yield;

/// Position of an entity on the tile grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EntityData {
    pub x: i64,
    pub y: i64,
}

/// A movable occupant of the map. The map relocates entities through this
/// interface and reports completed moves back via `on_move`.
pub trait MapEntity {
    fn data(&self) -> &EntityData;
    fn data_mut(&mut self) -> &mut EntityData;
    /// Invoked by the map after a successful relocation.
    fn on_move(&mut self, old_x: i64, old_y: i64, new_x: i64, new_y: i64);
}

#[derive(Clone, Copy, Default, Debug)]
pub struct Tile {
    pub wall: bool,
    /// Wall tiles with dirt can be dug out for material.
    pub dirt: bool,
    pub occupied: bool,
}

/// Shared tile grid. Structural mutation goes through `move_entity`/`dig` so
/// occupancy bookkeeping stays in one place. Single-threaded by design; any
/// cross-thread use would need its own synchronization layer.
pub struct Map {
    pub width: i64,
    pub height: i64,
    tiles: Vec<Tile>,
}

impl Map {
    /// Open floor everywhere.
    pub fn new(width: i64, height: i64) -> Self {
        assert!(width > 0 && height > 0, "map must have positive dimensions");
        Map {
            width,
            height,
            tiles: vec![Tile::default(); (width * height) as usize],
        }
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn tile(&self, x: i64, y: i64) -> &Tile {
        &self.tiles[(x + y * self.width) as usize]
    }

    fn tile_mut(&mut self, x: i64, y: i64) -> &mut Tile {
        &mut self.tiles[(x + y * self.width) as usize]
    }

    pub fn is_wall(&self, x: i64, y: i64) -> bool {
        self.in_bounds(x, y) && self.tile(x, y).wall
    }

    /// Raises a diggable dirt wall at the given tile.
    pub fn set_wall(&mut self, x: i64, y: i64) {
        let tile = self.tile_mut(x, y);
        tile.wall = true;
        tile.dirt = true;
    }

    pub fn can_place(&self, x: i64, y: i64) -> bool {
        self.in_bounds(x, y) && {
            let tile = self.tile(x, y);
            !tile.wall && !tile.occupied
        }
    }

    /// Places an entity at (x, y) if the tile is free. Position data is
    /// updated on success.
    pub fn try_place(&mut self, entity: &mut dyn MapEntity, x: i64, y: i64) -> bool {
        if !self.can_place(x, y) {
            return false;
        }
        self.tile_mut(x, y).occupied = true;
        let data = entity.data_mut();
        data.x = x;
        data.y = y;
        true
    }

    pub fn remove_entity(&mut self, entity: &dyn MapEntity) {
        let data = entity.data();
        if self.in_bounds(data.x, data.y) {
            self.tile_mut(data.x, data.y).occupied = false;
        }
    }

    /// Relocates an entity by (dx, dy). No-ops and returns false when the
    /// destination is blocked, occupied, or out of bounds; fires the entity's
    /// `on_move` callback on success.
    pub fn move_entity(&mut self, entity: &mut dyn MapEntity, dx: i64, dy: i64) -> bool {
        let (x, y) = {
            let data = entity.data();
            (data.x, data.y)
        };
        let (new_x, new_y) = (x + dx, y + dy);
        if !self.can_place(new_x, new_y) {
            trace!("move to ({new_x}, {new_y}) blocked");
            return false;
        }

        self.tile_mut(new_x, new_y).occupied = true;
        self.tile_mut(x, y).occupied = false;
        let data = entity.data_mut();
        data.x = new_x;
        data.y = new_y;

        entity.on_move(x, y, new_x, new_y);
        true
    }

    /// Extracts material from a dirt wall, turning it into open floor.
    /// Returns the yield, or None when there is nothing to dig.
    pub fn dig(&mut self, x: i64, y: i64) -> Option<Yield> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let tile = self.tile_mut(x, y);
        if !(tile.wall && tile.dirt) {
            return None;
        }
        tile.wall = false;
        tile.dirt = false;
        trace!("dug out tile ({x}, {y})");
        Some(Yield(1))
    }
}
