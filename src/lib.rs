pub mod amplifier;
pub mod config;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod program;

use std::fmt;

use caches::Cache;
use cpu::{Cpu, Instruction, Mode, OpCode, State};
use log::{debug, error, info, trace};
use memory::{Addressable, Memory};

pub use config::Config;
pub use error::{Error, Result};
pub use memory::Value;
pub use program::Program;

/// Decoded instructions keyed by address, together with the raw word each
/// was decoded from.
type DecodeCache = caches::AdaptiveCache<usize, (Value, Instruction)>;

/// Why a machine handed control back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Blocked on an input instruction; continue with `resume_with_input`.
    NeedInput,
    /// Produced a value; continue with `resume`.
    Output(Value),
    /// Executed a halt instruction. Memory stays readable.
    Halted,
}

/// A single Intcode interpreter.
///
/// The machine runs synchronously between suspension points and returns an
/// [`Event`] at each of them. Callers drive it with [`Machine::resume`] and
/// [`Machine::resume_with_input`]; any number of machines may be interleaved
/// by passing values between those calls.
pub struct Machine {
    cpu: Cpu,
    memory: Memory,
    config: Config,
    decode_cache: Option<DecodeCache>,
    // write address of the input instruction being waited on
    pending_input: Option<usize>,
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("cpu", &self.cpu)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Machine {
    pub fn new(program: Program) -> Self {
        Self::with_config(program, Config::default())
    }

    pub fn with_config(program: Program, config: Config) -> Self {
        // the cache only refuses a capacity of zero, which means "disabled"
        let decode_cache = DecodeCache::new(config.decode_cache_size).ok();

        let mut memory = Memory::new();
        memory.write_chunk(&program.data);

        Self {
            cpu: Cpu::new(),
            memory,
            config,
            decode_cache,
            pending_input: None,
        }
    }

    pub fn state(&self) -> State {
        self.cpu.state
    }

    pub fn instruction_pointer(&self) -> usize {
        self.cpu.ip
    }

    pub fn relative_base(&self) -> Value {
        self.cpu.relative_base
    }

    pub fn peek_memory(&self, address: Value) -> Result<Value> {
        Ok(self.memory.read(to_address(address)?))
    }

    pub fn poke_memory(&mut self, address: Value, value: Value) -> Result<()> {
        self.memory.write(to_address(address)?, value);
        Ok(())
    }

    /// Addresses `0..len` of memory.
    pub fn snapshot(&self, len: usize) -> Vec<Value> {
        self.memory.snapshot(len)
    }

    /// Runs until the next suspension point.
    pub fn resume(&mut self) -> Result<Event> {
        match self.cpu.state {
            State::Ready | State::Running | State::AwaitingOutput => {
                self.cpu.state = State::Running;
                self.run()
            }
            state => Err(Error::ProtocolViolation {
                operation: "resume",
                state,
            }),
        }
    }

    /// Completes a pending input instruction with `value` and runs until the
    /// next suspension point.
    pub fn resume_with_input(&mut self, value: Value) -> Result<Event> {
        let address = match (self.cpu.state, self.pending_input) {
            (State::AwaitingInput, Some(address)) => address,
            (state, _) => {
                return Err(Error::ProtocolViolation {
                    operation: "supply input",
                    state,
                })
            }
        };

        self.pending_input = None;
        self.memory.write(address, value);
        self.cpu.ip += OpCode::Input.width();
        self.cpu.state = State::Running;
        self.run()
    }

    /// Feeds `input` to every input request and returns the last output
    /// produced before the machine halts.
    ///
    /// Only suitable for programs that expect a single distinct input value.
    pub fn run_with_input(&mut self, input: Value) -> Result<Option<Value>> {
        let mut last_output = None;
        let mut event = self.resume()?;
        loop {
            event = match event {
                Event::NeedInput => self.resume_with_input(input)?,
                Event::Output(value) => {
                    last_output = Some(value);
                    self.resume()?
                }
                Event::Halted => break Ok(last_output),
            }
        }
    }

    /// Feeds `inputs` one per input request and collects every output until
    /// the machine halts.
    pub fn run_collecting<I>(&mut self, inputs: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut inputs = inputs.into_iter();
        let mut outputs = Vec::new();
        let mut event = self.resume()?;
        loop {
            event = match event {
                Event::NeedInput => match inputs.next() {
                    Some(value) => self.resume_with_input(value)?,
                    None => {
                        break Err(Error::InputExhausted {
                            address: self.cpu.ip,
                        })
                    }
                },
                Event::Output(value) => {
                    outputs.push(value);
                    self.resume()?
                }
                Event::Halted => break Ok(outputs),
            }
        }
    }

    fn debug_state(&self) {
        let ip = self.cpu.ip;
        let next_words = (ip..ip + 4).fold(String::new(), |acc, address| {
            acc + &format!("{} ", self.memory.read(address))
        });
        debug!(
            "State: IP: {}, RB: {}, {} | {}",
            ip, self.cpu.relative_base, self.cpu.state, next_words
        );
    }

    fn fault(&mut self, e: Error) -> Error {
        error!("machine faulted at {}: {}", self.cpu.ip, e);
        self.cpu.state = State::Faulted;
        e
    }

    fn run(&mut self) -> Result<Event> {
        let mut steps: u64 = 0;

        let event = loop {
            if let Some(limit) = self.config.step_limit.filter(|&limit| limit > 0) {
                if steps >= limit {
                    debug!("step limit reached after {} instructions", steps);
                    return Err(Error::StepLimitExceeded(limit));
                }
            }

            match self.step() {
                Ok(Some(event)) => break event,
                Ok(None) => steps += 1,
                Err(e) => return Err(self.fault(e)),
            }
        };

        debug!("suspended after {} instructions with {:?}", steps, event);
        self.debug_state();
        if event == Event::Halted {
            info!("{}", self.cpu);
        }
        Ok(event)
    }

    fn fetch(&mut self) -> Result<Instruction> {
        let address = self.cpu.ip;
        let word = self.memory.read(address);

        if let Some(cache) = self.decode_cache.as_mut() {
            if let Some(&(cached_word, instr)) = cache.get(&address) {
                if cached_word == word {
                    return Ok(instr);
                }
            }
        }

        trace!("decoding {} at {}", word, address);
        let instr = Instruction::decode(word, address)?;
        if let Some(cache) = self.decode_cache.as_mut() {
            cache.put(address, (word, instr));
        }
        Ok(instr)
    }

    /// Raw operand word of the 1-based parameter `n`.
    fn raw(&self, n: usize) -> Value {
        self.memory.read(self.cpu.ip + n)
    }

    fn relative(&self, offset: Value) -> Result<usize> {
        let address = self
            .cpu
            .relative_base
            .checked_add(offset)
            .ok_or(Error::Overflow {
                address: self.cpu.ip,
            })?;
        to_address(address)
    }

    /// Value of the 1-based parameter `n`.
    fn operand(&self, instr: &Instruction, n: usize) -> Result<Value> {
        let raw = self.raw(n);
        match instr.mode(n) {
            Mode::Position => Ok(self.memory.read(to_address(raw)?)),
            Mode::Immediate => Ok(raw),
            Mode::Relative => Ok(self.memory.read(self.relative(raw)?)),
        }
    }

    /// Address the 1-based parameter `n` writes through.
    fn target(&self, instr: &Instruction, n: usize) -> Result<usize> {
        let raw = self.raw(n);
        match instr.mode(n) {
            Mode::Position => to_address(raw),
            Mode::Immediate => Err(Error::ImmediateWrite {
                address: self.cpu.ip,
            }),
            Mode::Relative => self.relative(raw),
        }
    }

    fn binary<F>(&mut self, instr: &Instruction, op: F) -> Result<()>
    where
        F: FnOnce(Value, Value) -> Option<Value>,
    {
        let a = self.operand(instr, 1)?;
        let b = self.operand(instr, 2)?;
        let out = self.target(instr, 3)?;
        let value = op(a, b).ok_or(Error::Overflow {
            address: self.cpu.ip,
        })?;
        self.memory.write(out, value);
        self.cpu.ip += instr.opcode.width();
        Ok(())
    }

    fn jump_if<F>(&mut self, instr: &Instruction, cond: F) -> Result<()>
    where
        F: FnOnce(Value) -> bool,
    {
        let a = self.operand(instr, 1)?;
        let b = self.operand(instr, 2)?;
        if cond(a) {
            self.cpu.ip = to_address(b)?;
        } else {
            self.cpu.ip += instr.opcode.width();
        }
        Ok(())
    }

    /// Executes one instruction. Returns an event when execution must
    /// suspend.
    fn step(&mut self) -> Result<Option<Event>> {
        let instr = self.fetch()?;
        trace!("{}: {:?} {:?}", self.cpu.ip, instr.opcode, instr.modes);

        match instr.opcode {
            OpCode::Add => self.binary(&instr, Value::checked_add)?,
            OpCode::Multiply => self.binary(&instr, Value::checked_mul)?,
            OpCode::Input => {
                // resolved now so the caller is never asked for a value
                // that cannot be stored
                self.pending_input = Some(self.target(&instr, 1)?);
                self.cpu.state = State::AwaitingInput;
                return Ok(Some(Event::NeedInput));
            }
            OpCode::Output => {
                let a = self.operand(&instr, 1)?;
                self.cpu.ip += instr.opcode.width();
                self.cpu.state = State::AwaitingOutput;
                return Ok(Some(Event::Output(a)));
            }
            OpCode::JumpIfTrue => self.jump_if(&instr, |a| a != 0)?,
            OpCode::JumpIfFalse => self.jump_if(&instr, |a| a == 0)?,
            OpCode::LessThan => self.binary(&instr, |a, b| Some((a < b) as Value))?,
            OpCode::Equals => self.binary(&instr, |a, b| Some((a == b) as Value))?,
            OpCode::AdjustRelativeBase => {
                let a = self.operand(&instr, 1)?;
                self.cpu.relative_base =
                    self.cpu
                        .relative_base
                        .checked_add(a)
                        .ok_or(Error::Overflow {
                            address: self.cpu.ip,
                        })?;
                self.cpu.ip += instr.opcode.width();
            }
            OpCode::Halt => {
                self.cpu.state = State::Halted;
                return Ok(Some(Event::Halted));
            }
        }

        Ok(None)
    }
}

fn to_address(value: Value) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::NegativeAddress(value))
}
