//! Flow composition and execution

pub mod composer;
pub mod dispatch;
pub mod executor;
pub mod fault;
pub mod registry;
pub mod supervisor;

pub use composer::Composer;
pub use dispatch::{CompiledStep, Loop, Next, Sequence, StepHandle};
pub use executor::LeafStep;
pub use fault::{classify, Fault, RecoverableFault};
pub use registry::{Namespace, StepRegistry};
pub use supervisor::{CycleOutcome, CycleReport, CycleSupervisor, SupervisorConfig, SupervisorError};
