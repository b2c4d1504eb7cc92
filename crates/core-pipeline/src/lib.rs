//! Compile pipeline: debounce, sequence-gated compilation, export, and the
//! session loop tying them to the renderer, store, and display.

pub mod compiler;
pub mod debounce;
pub mod export;
pub mod invoker;
pub mod session;

pub use compiler::{CommandCompiler, DocumentCompiler};
pub use debounce::{DEFAULT_QUIET_PERIOD, DebounceScheduler, Debounced};
pub use export::{export_file_name, export_pdf};
pub use invoker::{CompileInvoker, InvokerStats, SequenceGate};
pub use session::{LoopControl, PreviewSession, SessionSettings, ShutdownReason};
