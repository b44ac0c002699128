use log::trace;

use crate::executor::OpExecutor;
use crate::inventory::Inventory;
use crate::map::{EntityData, Map, MapEntity};
use crate::ops::ExecContext;
use crate::registers::RegisterFile;

/// The map-facing half of an ant, split from the rest of the unit so the
/// executor can borrow it alongside the registers it drives.
pub struct AntBody {
    data: EntityData,
    moves_completed: u64,
}

impl AntBody {
    pub fn new(x: i64, y: i64) -> Self {
        AntBody {
            data: EntityData { x, y },
            moves_completed: 0,
        }
    }

    pub fn moves_completed(&self) -> u64 {
        self.moves_completed
    }
}

impl MapEntity for AntBody {
    fn data(&self) -> &EntityData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut EntityData {
        &mut self.data
    }

    fn on_move(&mut self, old_x: i64, old_y: i64, new_x: i64, new_y: i64) {
        self.moves_completed += 1;
        trace!("moved ({old_x}, {old_y}) -> ({new_x}, {new_y})");
    }
}

/// One programmable unit: its map presence, registers, haul, and compiled
/// program. Registers and program counter belong to this ant alone.
pub struct Ant {
    pub body: AntBody,
    pub registers: RegisterFile,
    pub inventory: Inventory,
    pub executor: OpExecutor,
}

impl Ant {
    pub fn new(x: i64, y: i64, executor: OpExecutor) -> Self {
        Ant {
            body: AntBody::new(x, y),
            registers: RegisterFile::new(),
            inventory: Inventory::new(),
            executor,
        }
    }

    /// Advances this ant by one global clock pulse.
    pub fn pulse(&mut self, map: &mut Map) {
        let mut ctx = ExecContext {
            registers: &mut self.registers,
            map,
            entity: &mut self.body,
            inventory: &mut self.inventory,
        };
        self.executor.handle_clock_pulse(&mut ctx);
    }

    pub fn is_idle(&self) -> bool {
        self.executor.is_halted()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ops::Op;
    use crate::registers::Register;

    #[test]
    fn ant_runs_its_program_against_the_map() {
        let mut map = Map::new(4, 1);
        map.set_wall(3, 0);

        let mut exec = OpExecutor::new();
        exec.add_op(Op::Move {
            dx: 1,
            dy: 0,
            speed: 12,
        });
        exec.add_op(Op::Move {
            dx: 1,
            dy: 0,
            speed: 12,
        });
        exec.add_op(Op::Dig { dx: 1, dy: 0 });
        exec.add_op(Op::LoadConst {
            reg: Register::A,
            value: 9,
        });

        let mut ant = Ant::new(0, 0, exec);
        assert!(map.try_place(&mut ant.body, 0, 0));

        while !ant.is_idle() {
            ant.pulse(&mut map);
        }

        assert_eq!((ant.body.data().x, ant.body.data().y), (2, 0));
        assert_eq!(ant.body.moves_completed(), 2);
        assert_eq!(ant.inventory.total(), 1);
        assert_eq!(ant.registers.a, 9);
        assert!(!map.is_wall(3, 0));
    }
}
