//! Object-safe view of a `Process` for the engine.

use vb_core::{Process, Real, Schema, State, Update};

use crate::error::{ComposeError, ComposeResult};

/// A process as the engine drives it, with its error erased.
pub trait Hosted {
    fn name(&self) -> &str;
    fn time_step(&self) -> Real;
    fn is_deriver(&self) -> bool;
    fn ports_schema(&self) -> Schema;
    fn initial_state(&self) -> State;
    fn advance(&mut self, interval: Real, states: &State) -> ComposeResult<Update>;
}

impl<P: Process> Hosted for P {
    fn name(&self) -> &str {
        Process::name(self)
    }

    fn time_step(&self) -> Real {
        Process::time_step(self)
    }

    fn is_deriver(&self) -> bool {
        Process::is_deriver(self)
    }

    fn ports_schema(&self) -> Schema {
        Process::ports_schema(self)
    }

    fn initial_state(&self) -> State {
        Process::initial_state(self)
    }

    fn advance(&mut self, interval: Real, states: &State) -> ComposeResult<Update> {
        Process::next_update(self, interval, states).map_err(|source| ComposeError::Process {
            process: Process::name(self).to_string(),
            time: states.global_time,
            source: Box::new(source),
        })
    }
}
