//! Service graph and router construction.

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tower::ServiceBuilder;

use matricula_auth::{InMemoryCodeStore, InMemoryMonitorDirectory, MonitorDirectory, Role};
use matricula_core::{Aggregate, AggregateId, DomainError, EditionId};
use matricula_enrollment::EnrollmentId;
use matricula_events::{EventBus, EventEnvelope, InMemoryEventBus};
use matricula_infra::{
    CommandDispatcher, DispatchError, EnrollmentDirectoryProjection, InMemoryEditionStore,
    InMemoryEventStore, StoredEvent,
};

use crate::mail::{MailSender, TracingMailSender};
use crate::middleware::{AuthState, auth_middleware};

use super::routes;

type Dispatcher =
    CommandDispatcher<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

type DirectoryProjection = EnrollmentDirectoryProjection<
    Arc<InMemoryEditionStore<EnrollmentId, matricula_infra::EnrollmentReadModel>>,
>;

/// Everything the handlers need, wired once at startup.
pub struct AppServices {
    dispatcher: Dispatcher,
    directory: Arc<DirectoryProjection>,
    monitors: Arc<InMemoryMonitorDirectory>,
    codes: Arc<InMemoryCodeStore>,
    mailer: Arc<dyn MailSender>,
    active_edition: EditionId,
}

impl AppServices {
    /// In-memory wiring: store + bus + projection pump.
    ///
    /// Must be called from within a tokio runtime (the projection consumer
    /// runs on a blocking task).
    pub fn in_memory() -> Arc<Self> {
        Self::in_memory_with_mailer(Arc::new(TracingMailSender))
    }

    pub fn in_memory_with_mailer(mailer: Arc<dyn MailSender>) -> Arc<Self> {
        let store = Arc::new(InMemoryEventStore::new());
        let bus: Arc<InMemoryEventBus<EventEnvelope<JsonValue>>> = Arc::new(InMemoryEventBus::new());

        let rm_store: Arc<InMemoryEditionStore<EnrollmentId, matricula_infra::EnrollmentReadModel>> =
            Arc::new(InMemoryEditionStore::new());
        let directory: Arc<DirectoryProjection> =
            Arc::new(EnrollmentDirectoryProjection::new(rm_store));

        // Background subscriber: bus -> projection (eventual consistency).
        {
            let sub = bus.subscribe();
            let directory = directory.clone();
            tokio::task::spawn_blocking(move || {
                loop {
                    match sub.recv() {
                        Ok(envelope) => {
                            if let Err(e) = directory.apply_envelope(&envelope) {
                                tracing::warn!("projection apply failed: {e}");
                            }
                        }
                        Err(_) => break, // bus dropped; shut the pump down
                    }
                }
            });
        }

        Arc::new(Self {
            dispatcher: CommandDispatcher::new(store, bus),
            directory,
            monitors: Arc::new(InMemoryMonitorDirectory::new()),
            codes: Arc::new(InMemoryCodeStore::new()),
            mailer,
            active_edition: EditionId::new(),
        })
    }

    /// Dispatch a command against the active edition.
    pub fn dispatch<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: A::Command,
        make_aggregate: impl FnOnce(EditionId, AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: matricula_events::Event + Serialize + DeserializeOwned,
    {
        self.dispatcher.dispatch::<A>(
            self.active_edition,
            aggregate_id,
            aggregate_type,
            command,
            make_aggregate,
        )
    }

    pub fn directory(&self) -> &DirectoryProjection {
        &self.directory
    }

    pub fn monitors(&self) -> &InMemoryMonitorDirectory {
        &self.monitors
    }

    pub fn codes(&self) -> &InMemoryCodeStore {
        &self.codes
    }

    pub fn mailer(&self) -> &dyn MailSender {
        self.mailer.as_ref()
    }

    pub fn active_edition(&self) -> EditionId {
        self.active_edition
    }
}

/// Build the full router over a service graph.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = AuthState {
        directory: services.monitors.clone() as Arc<dyn MonitorDirectory>,
        required: Role::Monitor,
    };

    // Panel routes sit behind bearer-email auth.
    let panel = Router::new()
        .route("/api/inscricoes", get(routes::enrollment::list_enrollments))
        .route(
            "/api/inscricoes/:id/aprovar",
            post(routes::enrollment::approve_enrollment),
        )
        .route(
            "/api/inscricoes/:id/reprovar",
            post(routes::enrollment::reject_enrollment),
        )
        .route(
            "/api/inscricoes/:id/excedente",
            post(routes::enrollment::waitlist_enrollment),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    Router::new()
        .route("/api/check-cpf", post(routes::check_cpf::check_cpf))
        .route("/api/inscricao", post(routes::enrollment::submit_enrollment))
        .route(
            "/api/send-verification",
            post(routes::auth::send_verification),
        )
        .route("/api/verify-code", post(routes::auth::verify_code))
        .merge(panel)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
