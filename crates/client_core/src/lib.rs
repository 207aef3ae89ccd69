use std::sync::Arc;

use tokio::sync::broadcast;

pub mod aggregator;
pub mod config;
pub mod error;
pub mod forms;
pub mod resources;
pub mod route;
pub mod session;
pub mod view_state;

pub use aggregator::{Aggregator, DashboardSummary, EnrollmentRoster, EnrollmentRow, NameDirectory};
pub use config::{load_settings, ClientSettings};
pub use error::{ClientError, PartialAggregationError};
pub use forms::{FormError, FormSubmitter, SubmitOutcome};
pub use resources::{ApiResult, ResourceClient, TrainingApi};
pub use route::Route;
pub use session::AuthSession;

/// Out-of-band notifications emitted by [`ResourceClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The backend rejected the bearer token. The token has been cleared.
    SessionExpired,
}

impl ClientEvent {
    pub fn redirect(&self) -> Route {
        match self {
            ClientEvent::SessionExpired => Route::Login,
        }
    }
}

/// The HTTP client plus the aggregation and form layers built on top of it,
/// all sharing one [`AuthSession`].
#[derive(Clone)]
pub struct TrackerClient {
    resources: Arc<ResourceClient>,
    aggregator: Aggregator,
    forms: FormSubmitter,
}

impl TrackerClient {
    pub fn new(settings: &ClientSettings) -> ApiResult<Self> {
        let session = match settings.auth_token.as_deref() {
            Some(token) => AuthSession::with_token(token),
            None => AuthSession::anonymous(),
        };
        let resources = Arc::new(ResourceClient::new(settings, session)?);
        Ok(Self::from_resources(resources, settings.fanout_concurrency))
    }

    pub fn from_resources(resources: Arc<ResourceClient>, fanout_concurrency: usize) -> Self {
        let aggregator = Aggregator::new(resources.clone(), fanout_concurrency);
        let forms = FormSubmitter::new(aggregator.clone());
        Self {
            resources,
            aggregator,
            forms,
        }
    }

    pub fn api(&self) -> &dyn TrainingApi {
        &*self.resources
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn forms(&self) -> &FormSubmitter {
        &self.forms
    }

    pub fn session(&self) -> &AuthSession {
        self.resources.session()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.resources.subscribe_events()
    }
}

#[cfg(test)]
#[path = "tests/fake_api.rs"]
pub(crate) mod fake_api;
