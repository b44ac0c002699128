use log::trace;

use crate::inventory::Inventory;
use crate::map::{Map, MapEntity};
use crate::registers::{Register, RegisterFile, Word};

/// Everything an instruction may touch during one pulse. Borrowed fresh for
/// each pulse; the ops themselves carry only selectors and resolved indices.
pub struct ExecContext<'a> {
    pub registers: &'a mut RegisterFile,
    pub map: &'a mut Map,
    pub entity: &'a mut dyn MapEntity,
    pub inventory: &'a mut Inventory,
}

/// What the scheduler should do with the program counter after a pulse.
/// Jumps report their true landing index; there is no off-by-one encoding.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PulseOutcome {
    Advance,
    Goto(usize),
}

/// One executable ant instruction with all operands resolved at assembly
/// time. Decode once, execute on every pulse.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Op {
    Nop,
    LoadConst { reg: Register, value: Word },
    Copy { src: Register, dst: Register },
    Add { src: Register, dst: Register },
    Sub { src: Register, dst: Register },
    Inc { reg: Register },
    Dec { reg: Register },
    Move { dx: i8, dy: i8, speed: u16 },
    Dig { dx: i8, dy: i8 },
    Jump { target: usize },
    JumpNotZero { target: usize },
}

impl Op {
    /// Executes one instruction against the borrowed unit state. Completes
    /// fully within the pulse; blocked map actions degrade to no-ops.
    pub fn execute(&self, ctx: &mut ExecContext) -> PulseOutcome {
        match *self {
            Op::Nop => {
                trace!("nop");
            }
            Op::LoadConst { reg, value } => {
                trace!("load {value} -> {reg}");
                ctx.registers.set(reg, value);
            }
            Op::Copy { src, dst } => {
                let val = ctx.registers.get(src);
                ctx.registers.set(dst, val);
                trace!("copy {src} -> {dst} ({val})");
            }
            Op::Add { src, dst } => {
                let val = ctx.registers.get(dst).wrapping_add(ctx.registers.get(src));
                ctx.registers.set(dst, val);
                trace!("add {src} -> {dst}, result {val}");
            }
            Op::Sub { src, dst } => {
                let val = ctx.registers.get(dst).wrapping_sub(ctx.registers.get(src));
                ctx.registers.set(dst, val);
                trace!("sub {src} -> {dst}, result {val}");
            }
            Op::Inc { reg } => {
                let val = ctx.registers.get(reg).wrapping_add(1);
                ctx.registers.set(reg, val);
                trace!("inc {reg}, result {val}");
            }
            Op::Dec { reg } => {
                let val = ctx.registers.get(reg).wrapping_sub(1);
                ctx.registers.set(reg, val);
                trace!("dec {reg}, result {val}");
            }
            Op::Move { dx, dy, speed: _ } => {
                if !ctx.map.move_entity(ctx.entity, dx as i64, dy as i64) {
                    trace!("move by ({dx}, {dy}) blocked");
                }
            }
            Op::Dig { dx, dy } => {
                let (x, y) = {
                    let data = ctx.entity.data();
                    (data.x + dx as i64, data.y + dy as i64)
                };
                if let Some(amount) = ctx.map.dig(x, y) {
                    if !ctx.inventory.add(amount) {
                        trace!("inventory full, yield dropped");
                    }
                }
            }
            Op::Jump { target } => {
                trace!("jump to {target}");
                return PulseOutcome::Goto(target);
            }
            Op::JumpNotZero { target } => {
                if ctx.registers.zero_flag {
                    trace!("zero flag set, falling through");
                } else {
                    trace!("zero flag clear, jumping to {target}");
                    return PulseOutcome::Goto(target);
                }
            }
        }
        PulseOutcome::Advance
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ant::AntBody;
    use crate::inventory::Yield;

    fn exec(op: Op, regs: &mut RegisterFile) -> PulseOutcome {
        let mut map = Map::new(1, 1);
        let mut body = AntBody::new(0, 0);
        let mut inv = Inventory::new();
        let mut ctx = ExecContext {
            registers: regs,
            map: &mut map,
            entity: &mut body,
            inventory: &mut inv,
        };
        op.execute(&mut ctx)
    }

    #[test]
    fn load_const_sets_zero_flag() {
        let mut regs = RegisterFile::new();
        exec(
            Op::LoadConst {
                reg: Register::A,
                value: 0,
            },
            &mut regs,
        );
        assert!(regs.zero_flag);
        exec(
            Op::LoadConst {
                reg: Register::A,
                value: 5,
            },
            &mut regs,
        );
        assert_eq!(regs.a, 5);
        assert!(!regs.zero_flag);
    }

    #[test]
    fn copy_flags_follow_source() {
        let mut regs = RegisterFile::new();
        regs.set(Register::A, 7);
        exec(
            Op::Copy {
                src: Register::A,
                dst: Register::B,
            },
            &mut regs,
        );
        assert_eq!(regs.b, 7);
        assert!(!regs.zero_flag);

        regs.set(Register::A, 0);
        regs.set(Register::B, 3);
        exec(
            Op::Copy {
                src: Register::A,
                dst: Register::B,
            },
            &mut regs,
        );
        assert_eq!(regs.b, 0);
        assert!(regs.zero_flag);
    }

    #[test]
    fn arithmetic_wraps_and_flags() {
        let mut regs = RegisterFile::new();
        regs.set(Register::A, 1);
        regs.set(Register::B, Word::MAX);
        exec(
            Op::Add {
                src: Register::A,
                dst: Register::B,
            },
            &mut regs,
        );
        assert_eq!(regs.b, 0);
        assert!(regs.zero_flag);

        regs.set(Register::B, 3);
        regs.set(Register::A, 3);
        exec(
            Op::Sub {
                src: Register::A,
                dst: Register::B,
            },
            &mut regs,
        );
        assert_eq!(regs.b, 0);
        assert!(regs.zero_flag);

        exec(Op::Dec { reg: Register::B }, &mut regs);
        assert_eq!(regs.b, Word::MAX);
        assert!(!regs.zero_flag);
        exec(Op::Inc { reg: Register::B }, &mut regs);
        assert_eq!(regs.b, 0);
        assert!(regs.zero_flag);
    }

    #[test]
    fn jumps_report_landing_index() {
        let mut regs = RegisterFile::new();
        assert_eq!(exec(Op::Jump { target: 3 }, &mut regs), PulseOutcome::Goto(3));

        regs.set(Register::A, 0); // zero flag set
        assert_eq!(
            exec(Op::JumpNotZero { target: 3 }, &mut regs),
            PulseOutcome::Advance
        );
        regs.set(Register::A, 1);
        assert_eq!(
            exec(Op::JumpNotZero { target: 3 }, &mut regs),
            PulseOutcome::Goto(3)
        );
    }

    #[test]
    fn dig_deposits_map_yield_into_inventory() {
        let mut map = Map::new(3, 1);
        map.set_wall(1, 0);
        let mut body = AntBody::new(0, 0);
        let mut regs = RegisterFile::new();
        let mut inv = Inventory::new();
        map.try_place(&mut body, 0, 0);

        let op = Op::Dig { dx: 1, dy: 0 };
        let mut ctx = ExecContext {
            registers: &mut regs,
            map: &mut map,
            entity: &mut body,
            inventory: &mut inv,
        };
        assert_eq!(op.execute(&mut ctx), PulseOutcome::Advance);
        assert_eq!(inv.total(), Yield(1).0);

        // Same tile again: nothing left, inventory unchanged
        let mut ctx = ExecContext {
            registers: &mut regs,
            map: &mut map,
            entity: &mut body,
            inventory: &mut inv,
        };
        op.execute(&mut ctx);
        assert_eq!(inv.total(), 1);
    }

    #[test]
    fn blocked_move_leaves_position() {
        let mut map = Map::new(2, 1);
        map.set_wall(1, 0);
        let mut body = AntBody::new(0, 0);
        let mut regs = RegisterFile::new();
        let mut inv = Inventory::new();
        map.try_place(&mut body, 0, 0);

        let mut ctx = ExecContext {
            registers: &mut regs,
            map: &mut map,
            entity: &mut body,
            inventory: &mut inv,
        };
        let op = Op::Move {
            dx: 1,
            dy: 0,
            speed: 12,
        };
        assert_eq!(op.execute(&mut ctx), PulseOutcome::Advance);
        assert_eq!((body.data().x, body.data().y), (0, 0));
    }
}
