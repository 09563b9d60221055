use std::fmt::Display;

use crate::error::{Error, Result};
use crate::memory::Value;

/// Lifecycle of a single machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Ready,
    Running,
    AwaitingInput,
    AwaitingOutput,
    Halted,
    Faulted,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Halted | State::Faulted)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            State::Ready => "ready",
            State::Running => "running",
            State::AwaitingInput => "awaiting input",
            State::AwaitingOutput => "awaiting output",
            State::Halted => "halted",
            State::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    pub ip: usize,            // The instruction pointer
    pub relative_base: Value, // Offset for relative-mode operands
    pub state: State,
}

impl Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cpu [ ip: {}, relative_base: {}, state: {} ]",
            self.ip, self.relative_base, self.state
        )
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            ip: 0,
            relative_base: 0,
            state: State::Ready,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Add                 =  1, // mem[c] = a + b
    Multiply            =  2, // mem[c] = a * b
    Input               =  3, // mem[a] = input
    Output              =  4, // output a
    JumpIfTrue          =  5, // if a != 0 then IP = b
    JumpIfFalse         =  6, // if a == 0 then IP = b
    LessThan            =  7, // mem[c] = a < b
    Equals              =  8, // mem[c] = a == b
    AdjustRelativeBase  =  9, // RB += a
    Halt                = 99,
}

impl OpCode {
    /// Number of parameters following the instruction word.
    pub fn arity(self) -> usize {
        match self {
            OpCode::Add | OpCode::Multiply | OpCode::LessThan | OpCode::Equals => 3,
            OpCode::JumpIfTrue | OpCode::JumpIfFalse => 2,
            OpCode::Input | OpCode::Output | OpCode::AdjustRelativeBase => 1,
            OpCode::Halt => 0,
        }
    }

    /// Distance from this instruction to the next one when it does not jump.
    pub fn width(self) -> usize {
        1 + self.arity()
    }
}

impl TryFrom<Value> for OpCode {
    type Error = Value;

    fn try_from(v: Value) -> std::result::Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Add),
            2 => Ok(Self::Multiply),
            3 => Ok(Self::Input),
            4 => Ok(Self::Output),
            5 => Ok(Self::JumpIfTrue),
            6 => Ok(Self::JumpIfFalse),
            7 => Ok(Self::LessThan),
            8 => Ok(Self::Equals),
            9 => Ok(Self::AdjustRelativeBase),
            99 => Ok(Self::Halt),
            _ => Err(v),
        }
    }
}

/// Parameter addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Position = 0,
    Immediate = 1,
    Relative = 2,
}

impl TryFrom<Value> for Mode {
    type Error = Value;

    fn try_from(v: Value) -> std::result::Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Position),
            1 => Ok(Self::Immediate),
            2 => Ok(Self::Relative),
            _ => Err(v),
        }
    }
}

/// An instruction word split into its opcode and parameter modes.
///
/// Modes of parameters the opcode does not take are left as `Position`
/// and never validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub modes: [Mode; 3],
}

impl Instruction {
    pub fn decode(word: Value, address: usize) -> Result<Self> {
        let opcode = OpCode::try_from(word % 100).map_err(|opcode| {
            log::error!("unknown opcode `{}` at {}", opcode, address);
            Error::InvalidOpcode { opcode, address }
        })?;

        let mut modes = [Mode::Position; 3];
        let mut digits = word / 100;
        for (index, mode) in modes.iter_mut().take(opcode.arity()).enumerate() {
            *mode = Mode::try_from(digits % 10).map_err(|mode| Error::InvalidMode {
                mode,
                parameter: index + 1,
                address,
            })?;
            digits /= 10;
        }

        Ok(Instruction { opcode, modes })
    }

    /// Mode of the 1-based parameter `n`.
    pub fn mode(&self, n: usize) -> Mode {
        self.modes[n - 1]
    }
}
