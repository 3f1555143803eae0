mod auth;
mod config;
mod error;
mod households;
mod models;
mod routes;
mod store;

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use clap::{Parser, Subcommand};
use config::Config;
use error::AppError;
use households::InvitePolicy;
use households::issuer::InviteIssuer;
use households::redeemer::InviteRedeemer;
use sqlx::PgPool;
use store::HouseholdStore;
use store::postgres::PgStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(version, about = "Household invite service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Mint an extra invite code for a household
    Invite {
        #[arg(long)]
        household: Uuid,
        /// Admin member the invite is issued on behalf of
        #[arg(long)]
        admin: Uuid,
    },
}

#[derive(Clone)]
pub struct AppState<S> {
    pub config: Arc<Config>,
    pub store: S,
    pub issuer: InviteIssuer<S>,
    pub redeemer: InviteRedeemer<S>,
}

impl<S: HouseholdStore> AppState<S> {
    pub fn new(config: Config, store: S) -> Self {
        let policy = InvitePolicy {
            ttl: config.invite_ttl(),
            max_uses: config.invite_max_uses,
        };
        Self {
            config: Arc::new(config),
            issuer: InviteIssuer::new(store.clone(), policy),
            redeemer: InviteRedeemer::new(store.clone()),
            store,
        }
    }
}

async fn health(
    State(state): State<AppState<PgStore>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let row: (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(state.store.pool())
        .await?;
    Ok(Json(serde_json::json!({ "status": "ok", "db": row.0 == 1 })))
}

async fn connect(config: &Config) -> PgStore {
    let db = PgPool::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!()
        .run(&db)
        .await
        .expect("failed to run migrations");

    PgStore::new(db)
}

async fn serve(config: Config) {
    let store = connect(&config).await;
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, store);

    let app = Router::new()
        .route("/api/health", get(health))
        .merge(routes::api_router::<PgStore>())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn issue_invite(config: Config, household: Uuid, admin: Uuid) {
    let store = connect(&config).await;
    let state = AppState::new(config, store);

    match state.issuer.issue_invite(household, admin).await {
        Ok(invite) => println!("{} (expires {})", invite.code, invite.expires_at),
        Err(e) => {
            tracing::error!(%household, %admin, "{e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Invite { household, admin } => issue_invite(config, household, admin).await,
    }
}
