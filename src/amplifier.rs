//! Chains of machines where each one's output is the next one's input.
//!
//! Every amplifier runs its own copy of the program. It first receives a
//! phase setting, then signals; the first amplifier gets a signal of 0.

use log::debug;

use crate::cpu::State;
use crate::error::{Error, Result};
use crate::memory::Value;
use crate::program::Program;
use crate::{Event, Machine};

/// Runs each amplifier once, in order, and returns the final signal.
pub fn run_chain(program: &Program, phases: &[Value]) -> Result<Value> {
    let mut signal = 0;
    for &phase in phases {
        let mut amplifier = with_phase(program, phase)?;
        signal = expect_output(amplifier.resume_with_input(signal)?)?;
    }
    Ok(signal)
}

/// Runs the amplifiers round-robin, feeding the last one's output back into
/// the first, until one of them halts. Returns the last signal produced.
///
/// With no phases there is nothing to drive and the initial signal of 0 is
/// returned, as for [`run_chain`].
pub fn run_feedback_loop(program: &Program, phases: &[Value]) -> Result<Value> {
    if phases.is_empty() {
        return Ok(0);
    }

    let mut amplifiers = phases
        .iter()
        .map(|&phase| with_phase(program, phase))
        .collect::<Result<Vec<_>>>()?;

    let mut signal = 0;
    let mut round = 0;
    loop {
        for amplifier in amplifiers.iter_mut() {
            if !wait_for_input(amplifier)? {
                debug!("feedback loop settled after {} rounds", round);
                return Ok(signal);
            }
            match amplifier.resume_with_input(signal)? {
                Event::Output(value) => signal = value,
                Event::Halted => return Ok(signal),
                found => {
                    return Err(Error::UnexpectedEvent {
                        expected: "output",
                        found,
                    })
                }
            }
        }
        round += 1;
    }
}

/// A fresh machine that has consumed its phase setting and is waiting for
/// its first signal.
fn with_phase(program: &Program, phase: Value) -> Result<Machine> {
    let mut machine = Machine::new(program.clone());
    expect_input(machine.resume()?)?;
    expect_input(machine.resume_with_input(phase)?)?;
    Ok(machine)
}

/// Drives `machine` to its next input request. Returns `false` if it halted
/// instead.
fn wait_for_input(machine: &mut Machine) -> Result<bool> {
    if machine.state() == State::AwaitingInput {
        return Ok(true);
    }
    match machine.resume()? {
        Event::NeedInput => Ok(true),
        Event::Halted => Ok(false),
        found => Err(Error::UnexpectedEvent {
            expected: "input request",
            found,
        }),
    }
}

fn expect_input(event: Event) -> Result<()> {
    match event {
        Event::NeedInput => Ok(()),
        found => Err(Error::UnexpectedEvent {
            expected: "input request",
            found,
        }),
    }
}

fn expect_output(event: Event) -> Result<Value> {
    match event {
        Event::Output(value) => Ok(value),
        found => Err(Error::UnexpectedEvent {
            expected: "output",
            found,
        }),
    }
}
