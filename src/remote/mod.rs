mod cache;
mod coordinator;
mod prober;
mod ssh;

pub use cache::ReachabilityCache;
pub use coordinator::PollingCoordinator;
pub use prober::ReachabilityProber;
#[allow(unused_imports)]
pub use ssh::{RemoteError, RemoteOutput, RemoteRunner, SshRunner};

#[cfg(test)]
pub(crate) use ssh::mock;
