//! The balancer's client-facing message handler.

use std::sync::Arc;

use glossa_core::SessionId;
use glossa_messaging::{MessageSink, SessionEventSink, SessionRegistry, WireMsg};
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;

/// Bridges client sessions onto the dispatcher.
pub struct BalancerService {
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<Dispatcher>,
}

impl BalancerService {
    /// Wire the service over the registry and dispatcher.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }
}

#[async_trait::async_trait]
impl MessageSink for BalancerService {
    async fn on_message(&self, session_id: SessionId, msg: WireMsg) {
        match msg {
            WireMsg::SuppLangReq(_) => {
                let resp = WireMsg::SuppLangResp(self.dispatcher.supported_languages());
                if !self.registry.send_response(session_id, &resp) {
                    debug!(%session_id, "language listing dropped, session closed");
                }
            }
            WireMsg::TransJobReq(req) => {
                self.dispatcher.dispatch(session_id, req);
            }
            other => {
                warn!(%session_id, msg_type = ?other.msg_type(), "unexpected client message ignored");
            }
        }
    }
}

impl SessionEventSink for BalancerService {
    fn session_closed(&self, session_id: SessionId) {
        self.dispatcher.cancel_session(session_id);
    }
}
