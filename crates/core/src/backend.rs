use crate::error::Result;
use async_trait::async_trait;

/// Liveness surface of the hypervisor process backing a sandbox.
#[async_trait]
pub trait HypervisorProbe: Send + Sync {
    /// Returns an error if the hypervisor process is no longer healthy.
    async fn check(&self) -> Result<()>;
}

/// Liveness surface of the agent running inside the guest.
#[async_trait]
pub trait AgentProbe: Send + Sync {
    /// Returns an error if the agent does not answer.
    async fn check(&self) -> Result<()>;

    /// Records that the agent is unreachable. Called before any failure is
    /// broadcast to watchers.
    fn mark_dead(&self);
}
