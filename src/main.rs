#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use axum::extract::FromRef;
    use axum::routing::{get, post};
    use axum::Router;
    use leptos::prelude::*;
    use leptos_axum::{generate_route_list, LeptosRoutes};
    use log::info;
    use std::time::Duration;
    use tokio::signal;
    use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
    use visit_counter::{server, ui};

    #[derive(Clone)]
    struct AppState {
        leptos_options: LeptosOptions,
        backend: server::Backend,
    }

    impl FromRef<AppState> for LeptosOptions {
        fn from_ref(state: &AppState) -> Self {
            state.leptos_options.clone()
        }
    }

    impl FromRef<AppState> for server::Backend {
        fn from_ref(state: &AppState) -> Self {
            state.backend.clone()
        }
    }

    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    dotenv::dotenv().ok();

    let level = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(level).init();

    let secret = std::env::var("JWT_SECRET_KEY")
        .context("Environment variable JWT_SECRET_KEY is required")?;

    let conf = get_configuration(None).context("Failed to read leptos configuration")?;
    let leptos_options = conf.leptos_options;
    let addr = leptos_options.site_addr;
    let routes = generate_route_list(ui::App);

    let state = AppState {
        leptos_options: leptos_options.clone(),
        backend: server::Backend::new(secret.as_bytes()),
    };

    let app = Router::new()
        .route("/login", post(server::login))
        .route("/signup", post(server::signup))
        .route("/verify", get(server::verify))
        .route("/api", get(server::visit_count))
        .leptos_routes(&state, routes, {
            let leptos_options = leptos_options.clone();
            move || ui::shell(leptos_options.clone())
        })
        .fallback(leptos_axum::file_and_error_handler::<AppState, _>(
            ui::shell,
        ))
        .with_state(state)
        .layer((
            TraceLayer::new_for_http(),
            TimeoutLayer::new(Duration::from_secs(2)),
        ));

    info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to server socket {addr}"))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve app")
}

#[cfg(not(feature = "ssr"))]
fn main() {
    // Binary is only meaningful with the ssr feature; the hydrate build uses
    // the cdylib entry point instead.
}
