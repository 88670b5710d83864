//! Built-in steps and environment modules

pub mod check_maintenance;
pub mod close_popups;
pub mod guarded;
pub mod periodic_reload;
pub mod report_location;
pub mod solve_challenge;
pub mod trigger_action;
pub mod update_environment;

pub use check_maintenance::CheckMaintenance;
pub use close_popups::ClosePopups;
pub use guarded::{new_event_pending, Guarded, GuardedStep};
pub use periodic_reload::PeriodicReload;
pub use report_location::ReportLocation;
pub use solve_challenge::SolveChallenge;
pub use trigger_action::TriggerAction;
pub use update_environment::UpdateEnvironment;

use crate::driver::ChallengeSolver;
use crate::execution::registry::{Namespace, StepRegistry};
use std::sync::Arc;

/// Registry holding every built-in step
pub fn builtin_registry(solver: Arc<dyn ChallengeSolver>) -> StepRegistry {
    let mut registry = StepRegistry::new();

    registry
        .register_step(Namespace::Core, "ClosePopups", || Box::new(ClosePopups::default()))
        .register_step(Namespace::Core, "CheckMaintenance", || Box::new(CheckMaintenance::default()))
        .register_step(Namespace::Core, "PeriodicReload", || {
            Box::new(Guarded(PeriodicReload::default()))
        })
        .register_step(Namespace::Core, "TriggerAction", || {
            Box::new(Guarded(TriggerAction::default()))
        })
        .register_step(Namespace::Core, "SolveChallenge", move || {
            Box::new(SolveChallenge::new(solver.clone()))
        })
        .register_step(Namespace::Core, "UpdateEnvironment", || {
            Box::new(UpdateEnvironment::default())
        })
        .register_step(Namespace::Environment, "ReportLocation", || {
            Box::new(ReportLocation::default())
        });

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{SolverConfig, SubprocessSolver};

    #[test]
    fn test_builtin_names() {
        let registry = builtin_registry(Arc::new(SubprocessSolver::new(&SolverConfig::default())));

        assert_eq!(
            registry.names(Namespace::Core),
            vec![
                "CheckMaintenance",
                "ClosePopups",
                "PeriodicReload",
                "SolveChallenge",
                "TriggerAction",
                "UpdateEnvironment",
            ]
        );
        assert_eq!(registry.names(Namespace::Environment), vec!["ReportLocation"]);
    }
}
