//! # PLC Program Interface
//!
//! The generated IEC 61131-3 program is an external collaborator. The
//! executive only initialises it, runs it once per scan, and reaches into
//! its variable table on behalf of the debugger.

/// The generated logic executor.
pub trait LogicExecutor {
    /// (Re)initialise every program instance to its declared initial values.
    fn init(&mut self);

    /// Execute one scan of the configuration at the given tick.
    fn run(&mut self, tick: u32);
}

/// Variable reflection backend used by the trace and force commands.
///
/// Indices are assigned by the code generator. Unknown indices report a
/// size of zero and an empty value.
pub trait VariableBackend {
    /// Size in bytes of the variable at `index`.
    fn var_size(&self, index: usize) -> usize;

    /// Current value of the variable at `index`.
    fn var_value(&self, index: usize) -> &[u8];

    /// Enable or disable tracing of a variable, optionally seeding it.
    fn set_trace(&mut self, index: usize, enable: bool, value: &[u8]);

    /// Override a variable regardless of logic output. The payload layout
    /// belongs to the backend.
    fn force(&mut self, payload: &[u8]) {
        let _ = payload;
    }

    /// Drop every trace registration.
    fn reset_trace(&mut self) {}
}

/// A generated program together with its variable table. Both interfaces
/// share the program's storage, so the executive holds them as one object.
pub trait Program: LogicExecutor + VariableBackend {}

impl<T: LogicExecutor + VariableBackend> Program for T {}
