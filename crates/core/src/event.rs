use crate::{InstanceRef, ResourceInstance};

/// Lifecycle notification for one Game instance.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Created(ResourceInstance),
    Deleted(InstanceRef),
    /// Controller (re)attached to an existing instance after start.
    Resumed(ResourceInstance),
    /// Periodic self-heal check.
    TimerTick(ResourceInstance),
}

impl LifecycleEvent {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::Created(_) => "created",
            LifecycleEvent::Deleted(_) => "deleted",
            LifecycleEvent::Resumed(_) => "resumed",
            LifecycleEvent::TimerTick(_) => "timer",
        }
    }

    pub fn instance_ref(&self) -> InstanceRef {
        match self {
            LifecycleEvent::Deleted(r) => r.clone(),
            LifecycleEvent::Created(i) | LifecycleEvent::Resumed(i) | LifecycleEvent::TimerTick(i) => i.instance_ref(),
        }
    }
}
