use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use log::trace;

use crate::ops::{ExecContext, Op, PulseOutcome};

type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Where a unit's program counter currently stands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExecState {
    /// The next pulse executes the op at this index.
    Running(usize),
    /// The counter ran past the end of the program; pulses idle.
    Halted,
}

/// Per-unit scheduler. Owns one compiled instruction sequence, its label
/// table, and the program counter, and advances exactly one instruction per
/// clock pulse. There is no halt instruction; termination is reaching an
/// index at or past the end of the sequence.
pub struct OpExecutor {
    ops: Vec<Op>,
    labels: FxMap<String, usize>,
    state: ExecState,
}

impl OpExecutor {
    pub fn new() -> Self {
        OpExecutor {
            ops: Vec::new(),
            labels: IndexMap::with_hasher(FxBuildHasher::default()),
            state: ExecState::Running(0),
        }
    }

    /// Appends an executable instruction and returns its index.
    pub fn add_op(&mut self, op: Op) -> usize {
        self.ops.push(op);
        self.ops.len() - 1
    }

    /// Binds a label to the next index to be appended. Returns false if the
    /// name is already taken.
    pub fn add_label(&mut self, name: impl Into<String>) -> bool {
        let next = self.ops.len();
        self.add_label_at(name, next)
    }

    /// Binds a label to an explicit instruction index.
    pub fn add_label_at(&mut self, name: impl Into<String>, idx: usize) -> bool {
        let name = name.into();
        if self.labels.contains_key(&name) {
            return false;
        }
        self.labels.insert(name, idx);
        true
    }

    /// Exact-match, case-sensitive label lookup.
    pub fn label_idx(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        match self.state {
            ExecState::Running(idx) => idx >= self.ops.len(),
            ExecState::Halted => true,
        }
    }

    /// Explicit program-counter relocation, for restarts and debugging.
    /// Indices past the end are a caller bug, not program data.
    pub fn set_op_idx(&mut self, idx: usize) {
        assert!(
            idx <= self.ops.len(),
            "op index {idx} out of range for program of length {}",
            self.ops.len()
        );
        self.state = self.normalize(idx);
    }

    /// Relocates the program counter to a label.
    ///
    /// # Panics
    /// Panics when the label was never declared; callers relocate only to
    /// labels they created.
    pub fn set_op_label(&mut self, name: &str) {
        let idx = self
            .label_idx(name)
            .unwrap_or_else(|| panic!("label '{name}' does not exist"));
        self.state = self.normalize(idx);
    }

    fn normalize(&self, idx: usize) -> ExecState {
        if idx < self.ops.len() {
            ExecState::Running(idx)
        } else {
            ExecState::Halted
        }
    }

    /// Executes exactly one instruction if the unit is running, then applies
    /// the outcome to the program counter. Idles when halted.
    pub fn handle_clock_pulse(&mut self, ctx: &mut ExecContext) {
        let idx = match self.state {
            ExecState::Running(idx) if idx < self.ops.len() => idx,
            _ => {
                self.state = ExecState::Halted;
                return;
            }
        };

        trace!("pulse: executing op {idx}");
        let next = match self.ops[idx].execute(ctx) {
            PulseOutcome::Advance => idx + 1,
            PulseOutcome::Goto(target) => target,
        };
        self.state = self.normalize(next);
    }

    /// Patches the target of a previously appended jump during backpatching.
    pub(crate) fn patch_jump(&mut self, idx: usize, target: usize) {
        match &mut self.ops[idx] {
            Op::Jump { target: t } | Op::JumpNotZero { target: t } => *t = target,
            other => unreachable!("patched op {other:?} is not a jump"),
        }
    }
}

impl Default for OpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ant::AntBody;
    use crate::inventory::Inventory;
    use crate::map::Map;
    use crate::registers::{Register, RegisterFile};

    struct Harness {
        regs: RegisterFile,
        map: Map,
        body: AntBody,
        inv: Inventory,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                regs: RegisterFile::new(),
                map: Map::new(1, 1),
                body: AntBody::new(0, 0),
                inv: Inventory::new(),
            }
        }

        fn pulse(&mut self, exec: &mut OpExecutor) {
            let mut ctx = ExecContext {
                registers: &mut self.regs,
                map: &mut self.map,
                entity: &mut self.body,
                inventory: &mut self.inv,
            };
            exec.handle_clock_pulse(&mut ctx);
        }
    }

    fn inc_a() -> Op {
        Op::Inc { reg: Register::A }
    }

    #[test]
    fn straight_line_executes_in_order() {
        let mut exec = OpExecutor::new();
        for _ in 0..4 {
            exec.add_op(inc_a());
        }
        let mut h = Harness::new();

        for n in 1..=3 {
            h.pulse(&mut exec);
            assert_eq!(h.regs.a, n);
            assert_eq!(exec.state(), ExecState::Running(n as usize));
        }
        h.pulse(&mut exec);
        assert_eq!(h.regs.a, 4);
        assert_eq!(exec.state(), ExecState::Halted);

        // Pulses past the end idle
        h.pulse(&mut exec);
        assert_eq!(h.regs.a, 4);
        assert!(exec.is_halted());
    }

    #[test]
    fn jump_lands_next_pulse_on_target() {
        // 0: jmp 3, 1: inc, 2: inc, 3: inc
        let mut exec = OpExecutor::new();
        exec.add_op(Op::Jump { target: 3 });
        for _ in 0..3 {
            exec.add_op(inc_a());
        }
        let mut h = Harness::new();

        h.pulse(&mut exec);
        assert_eq!(exec.state(), ExecState::Running(3));
        h.pulse(&mut exec);
        // Only op 3 ran
        assert_eq!(h.regs.a, 1);
        assert_eq!(exec.state(), ExecState::Halted);
    }

    #[test]
    fn jump_to_index_zero_restarts() {
        let mut exec = OpExecutor::new();
        exec.add_op(inc_a());
        exec.add_op(Op::Jump { target: 0 });
        let mut h = Harness::new();

        for _ in 0..6 {
            h.pulse(&mut exec);
        }
        assert_eq!(h.regs.a, 3);
        assert!(!exec.is_halted());
    }

    #[test]
    fn jnz_with_zero_flag_falls_through() {
        let mut exec = OpExecutor::new();
        exec.add_op(Op::LoadConst {
            reg: Register::A,
            value: 0,
        });
        exec.add_op(Op::JumpNotZero { target: 0 });
        exec.add_op(inc_a());
        let mut h = Harness::new();

        h.pulse(&mut exec);
        h.pulse(&mut exec);
        assert_eq!(exec.state(), ExecState::Running(2));
    }

    #[test]
    fn self_jump_never_advances() {
        let mut exec = OpExecutor::new();
        exec.add_op(Op::Jump { target: 0 });
        let mut h = Harness::new();

        for _ in 0..10_000 {
            h.pulse(&mut exec);
            assert_eq!(exec.state(), ExecState::Running(0));
        }
    }

    #[test]
    fn countdown_loop_terminates() {
        // a := 3; loop: dec a; jnz loop
        let mut exec = OpExecutor::new();
        exec.add_op(Op::LoadConst {
            reg: Register::A,
            value: 3,
        });
        exec.add_label("loop");
        exec.add_op(Op::Dec { reg: Register::A });
        exec.add_op(Op::JumpNotZero { target: 1 });
        let mut h = Harness::new();

        let mut pulses = 0;
        while !exec.is_halted() && pulses < 100 {
            h.pulse(&mut exec);
            pulses += 1;
        }
        assert_eq!(h.regs.a, 0);
        assert_eq!(pulses, 7);
        assert!(exec.is_halted());
    }

    #[test]
    fn labels_resolve_and_relocate() {
        let mut exec = OpExecutor::new();
        exec.add_op(inc_a());
        exec.add_label("again");
        exec.add_op(inc_a());
        assert_eq!(exec.label_idx("again"), Some(1));
        assert_eq!(exec.label_idx("AGAIN"), None);
        assert!(!exec.add_label("again"));

        exec.set_op_idx(2);
        assert!(exec.is_halted());
        exec.set_op_label("again");
        assert_eq!(exec.state(), ExecState::Running(1));
    }

    #[test]
    fn empty_program_idles() {
        let mut exec = OpExecutor::new();
        let mut h = Harness::new();
        h.pulse(&mut exec);
        assert!(exec.is_halted());
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn relocating_to_unknown_label_panics() {
        let mut exec = OpExecutor::new();
        exec.add_op(inc_a());
        exec.set_op_label("nowhere");
    }
}
