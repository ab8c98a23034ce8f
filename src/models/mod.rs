mod host;
mod reachability;
mod signal;

#[allow(unused_imports)]
pub use host::{HostConfigError, HostDescriptor, SshTarget, LOCAL_HOST_NAME};
#[allow(unused_imports)]
pub use reachability::{ReachabilityRecord, ReachabilityState, REACHABILITY_TTL_MS};
#[allow(unused_imports)]
pub use signal::{SignalRecord, SignalStatus, SIGNAL_STALE_MS, SIGNAL_SWEEP_MS};
