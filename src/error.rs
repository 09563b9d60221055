use std::num::ParseIntError;

use thiserror::Error;

use crate::cpu::State;
use crate::memory::Value;
use crate::Event;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid opcode {opcode} at address {address}")]
    InvalidOpcode { opcode: Value, address: usize },
    #[error("invalid mode {mode} for parameter {parameter} at address {address}")]
    InvalidMode {
        mode: Value,
        parameter: usize,
        address: usize,
    },
    #[error("immediate mode write target in instruction at address {address}")]
    ImmediateWrite { address: usize },
    #[error("negative address {0}")]
    NegativeAddress(Value),
    #[error("arithmetic overflow in instruction at address {address}")]
    Overflow { address: usize },
    #[error("cannot {operation} while {state}")]
    ProtocolViolation {
        operation: &'static str,
        state: State,
    },
    #[error("step limit of {0} instructions exceeded")]
    StepLimitExceeded(u64),
    #[error("malformed program text at token {index} ({token:?})")]
    MalformedProgram {
        index: usize,
        token: String,
        source: ParseIntError,
    },
    #[error("no input left for instruction at address {address}")]
    InputExhausted { address: usize },
    #[error("expected {expected}, got {found:?}")]
    UnexpectedEvent {
        expected: &'static str,
        found: Event,
    },
}

impl Error {
    /// Whether this error aborts the machine that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidOpcode { .. }
                | Error::InvalidMode { .. }
                | Error::ImmediateWrite { .. }
                | Error::NegativeAddress(_)
                | Error::Overflow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
