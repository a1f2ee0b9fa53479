/// Monitoring core
///
/// Leaf-first: the prober performs one bounded reachability check, the
/// classifier maps its outcome to a status, the scheduler decides which
/// services are due and fans the checks out, the notifier turns status
/// transitions into alerts, and the propagator rederives dependency-edge
/// statuses.
pub mod classifier;
pub mod notifier;
pub mod prober;
pub mod propagator;
pub mod scheduler;
pub mod types;

pub use classifier::Classifier;
pub use notifier::TransitionNotifier;
pub use propagator::ConnectionPropagator;
pub use scheduler::Scheduler;
pub use types::{ProbeOutcome, ServiceStatus};
