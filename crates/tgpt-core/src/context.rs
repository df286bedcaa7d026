use std::sync::Arc;

use crate::{
    completion::CompletionClient,
    config::Config,
    dispatch::{DispatchSettings, Dispatcher},
    messaging::port::{MessagingPort, WebhookPort},
    receiver::Receiver,
};

/// Everything a running bot needs, built once at startup and shared by
/// reference with the HTTP layer.
#[derive(Clone)]
pub struct AppContext {
    pub cfg: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
    pub receiver: Arc<Receiver>,
}

impl AppContext {
    pub fn new(
        cfg: Arc<Config>,
        messenger: Arc<dyn MessagingPort>,
        webhook: Arc<dyn WebhookPort>,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(
            completion,
            messenger,
            DispatchSettings::from_config(&cfg),
        ));
        let receiver = Arc::new(Receiver::new(
            webhook,
            dispatcher.clone(),
            cfg.drop_pending_updates,
        ));
        Self {
            cfg,
            dispatcher,
            receiver,
        }
    }
}
