use std::fmt;
use std::str::FromStr;

/// Machine word held in an ant register.
pub type Word = u16;

/// Register selector carried inside instructions. Resolved against the owning
/// unit's [`RegisterFile`] at execute time, so instructions never hold live
/// references into another unit's state.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Register {
    /// Primary / accumulator.
    A = 0,
    /// Secondary.
    B,
}

impl Register {
    pub fn from_selector(byte: u8) -> Option<Register> {
        match byte {
            0 => Some(Register::A),
            1 => Some(Register::B),
            _ => None,
        }
    }
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(Register::A),
            "b" | "B" => Ok(Register::B),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::A => f.write_str("a"),
            Register::B => f.write_str("b"),
        }
    }
}

/// The working registers of one ant. Owned exclusively by that ant; no other
/// unit may read or write them.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct RegisterFile {
    pub a: Word,
    pub b: Word,
    /// Tracks whether the most recent load/copy/arithmetic result was zero.
    /// Never written independently of a register write.
    pub zero_flag: bool,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reg: Register) -> Word {
        match reg {
            Register::A => self.a,
            Register::B => self.b,
        }
    }

    /// Writes a register and recomputes the zero flag from the stored value.
    pub fn set(&mut self, reg: Register, val: Word) {
        match reg {
            Register::A => self.a = val,
            Register::B => self.b = val,
        }
        self.zero_flag = val == 0;
    }
}
