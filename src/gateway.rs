//! Outbound action boundary.

/// Fire-and-forget request asking the backend to raise the energy level.
///
/// Implementations must not block and must swallow (and log) their own
/// failures. The energy change, if any, arrives later through the push feed.
pub trait ActionGateway {
    fn boost(&self);
}

impl<G: ActionGateway + ?Sized> ActionGateway for &G {
    fn boost(&self) {
        (**self).boost();
    }
}
