use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use sessio::store::MemoryStore;
use sessio::{Flash, Session, SessionConfig, SessionLayer};
use tower_cookies::CookieManagerLayer;
use tracing_subscriber::EnvFilter;

type AppSession = Session<MemoryStore>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
enum Theme {
    Light,
    #[default]
    Dark,
}

async fn index(session: AppSession, flash: Flash) -> Result<String, StatusCode> {
    let visits: u32 = session
        .get_or("visits", 0)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    session
        .set("visits", &(visits + 1))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let theme: Theme = session
        .get_or_set("theme", Theme::default())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(format!(
        "visits: {}, theme: {:?}, flash: {:?}",
        visits + 1,
        theme,
        flash.get()
    ))
}

async fn toggle_theme(session: AppSession) -> Result<Redirect, StatusCode> {
    let theme = match session.get_or("theme", Theme::default()) {
        Ok(Theme::Dark) => Theme::Light,
        Ok(Theme::Light) => Theme::Dark,
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    session
        .set("theme", &theme)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    session
        .set_flash(format!("Theme switched to {theme:?}"))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Redirect::to("/"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Arc::new(SessionConfig::from_env()?);
    let store = Arc::new(MemoryStore::new().with_expiry(30 * 60));
    let session_layer = SessionLayer::new(store).with_config(config);

    let app = Router::new()
        .route("/", get(index))
        .route("/theme", post(toggle_theme))
        .layer(session_layer)
        .layer(CookieManagerLayer::new());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
