//! Location capability.
//!
//! The core never touches platform location APIs. It asks the shell for a
//! permission decision or for one position fix, and the shell answers with a
//! [`LocationResponse`]. Fix payloads are passed through untouched as JSON so
//! the core can parse whatever shape the platform produces.

use serde::{Deserialize, Serialize};

use crux_core::capability::{Capability, CapabilityContext, Operation};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LocationOperation {
    RequestPermission,
    CurrentPosition { timeout_ms: u64, high_accuracy: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LocationResponse {
    Permission { granted: bool },
    Fix { payload: serde_json::Value },
    TimedOut,
    Unavailable { reason: String },
}

impl Operation for LocationOperation {
    type Output = LocationResponse;
}

pub struct Location<Ev> {
    context: CapabilityContext<LocationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Location<Ev> {
    type Operation = LocationOperation;
    type MappedSelf<MappedEv> = Location<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Location::new(self.context.map_event(f))
    }
}

impl<Ev> Location<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<LocationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn request_permission<F>(&self, callback: F)
    where
        F: FnOnce(LocationResponse) -> Ev + Send + 'static,
    {
        self.request(LocationOperation::RequestPermission, callback);
    }

    pub fn current_position<F>(&self, timeout_ms: u64, high_accuracy: bool, callback: F)
    where
        F: FnOnce(LocationResponse) -> Ev + Send + 'static,
    {
        self.request(
            LocationOperation::CurrentPosition {
                timeout_ms,
                high_accuracy,
            },
            callback,
        );
    }

    fn request<F>(&self, operation: LocationOperation, callback: F)
    where
        F: FnOnce(LocationResponse) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let response = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(response));
        });
    }
}
