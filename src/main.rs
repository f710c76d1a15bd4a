use axum::{
    middleware,
    response::Redirect,
    routing::{get, get_service, post},
    Router,
};
use dotenvy::dotenv;
use http::header::{HeaderValue, CACHE_CONTROL};
use std::env;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use eventdesk::api::EntityApi;
use eventdesk::web::middleware::auth as auth_middleware;
use eventdesk::web::routes::{
    auth, check_in, dashboard, events, manual_registration, organizers, participants, registration,
};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();

    // 2. Client for the remote entity store
    let api = EntityApi::from_env();

    // 3. Staff routes behind one auth layer
    let protected_routes = Router::new()
        .route("/dashboard", get(dashboard::dashboard_handler))
        .route("/events/new", get(events::event_form_handler))
        .route("/events/save", post(events::save_event_handler))
        .route("/events/details", get(events::event_details_handler))
        .route(
            "/check-in",
            get(check_in::check_in_page).post(check_in::check_in_handler),
        )
        .route("/check-in/scan", post(check_in::scan_frame_handler))
        .route("/check-in/confirm", post(check_in::confirm_payment_handler))
        .route(
            "/manual-registration",
            get(manual_registration::manual_registration_page)
                .post(manual_registration::manual_registration_handler),
        )
        .route("/participants/edit", get(participants::edit_participant_page))
        .route(
            "/participants/update",
            post(participants::update_participant_handler),
        )
        .route(
            "/participants/delete",
            post(participants::delete_participant_handler),
        )
        .route("/organizers", get(organizers::organizers_page))
        .route("/organizers/create", post(organizers::create_organizer_handler))
        .route("/organizers/update", post(organizers::update_organizer_handler))
        .route("/organizers/delete", post(organizers::delete_organizer_handler))
        .route("/logout", post(auth::logout_handler))
        .layer(middleware::from_fn(auth_middleware::require_auth));

    // 4. Whole application: public registration stays outside the auth layer
    let app = Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route(
            "/register",
            get(registration::registration_page).post(registration::registration_handler),
        )
        .merge(protected_routes)
        .nest_service(
            "/assets",
            get_service(ServeDir::new("assets")).layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(api);

    // 5. Start the server (with fallback port)
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("invalid HOST/PORT");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "⚠️  could not bind {}: {}. trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("invalid fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("could not bind fallback port")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    println!("🚀 eventdesk running at http://{}", bound_addr);
    println!("📍 open http://{}/login to sign in", bound_addr);

    axum::serve(listener, app).await.unwrap();
}
