use matricula_api::app::{AppServices, build_app};
use matricula_auth::{Monitor, Role};
use matricula_core::MonitorId;

#[tokio::main]
async fn main() {
    matricula_observability::init();

    let services = AppServices::in_memory();

    // The monitor table is an external collaborator in production; dev
    // deployments seed a single admin from the environment.
    match std::env::var("MONITOR_EMAIL") {
        Ok(email) => {
            let name =
                std::env::var("MONITOR_NAME").unwrap_or_else(|_| "Coordenação".to_string());
            services.monitors().insert(Monitor {
                id: MonitorId::new(),
                name,
                email,
                role: Role::Adm,
            });
        }
        Err(_) => {
            tracing::warn!("MONITOR_EMAIL not set; panel routes will reject all requests");
        }
    }

    let app = build_app(services);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("failed to bind listener");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
