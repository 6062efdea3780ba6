//! # Grind Souls Backend
//!
//! Quest, life-area and reward progression engine.
//!
//! ```text
//! IO Layer (REST API)
//!     ↓
//! Domain Layer (game rules, services)
//!     ↓
//! Storage Layer (CSV + YAML files, journaled commits)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::domain::{
    Clock, LifeAreaService, QuestService, RandomSource, RewardShopService, SubtaskService,
    SystemClock, ThreadRandom, UserService,
};
use crate::io::rest::{life_area_apis, quest_apis, reward_apis, subtask_apis, user_apis};
use crate::storage::csv::CsvConnection;

/// Services shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub quest_service: Arc<QuestService<CsvConnection>>,
    pub subtask_service: Arc<SubtaskService<CsvConnection>>,
    pub life_area_service: Arc<LifeAreaService<CsvConnection>>,
    pub reward_shop_service: Arc<RewardShopService<CsvConnection>>,
    pub user_service: Arc<UserService<CsvConnection>>,
}

impl AppState {
    pub fn new(
        connection: CsvConnection,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        let quest_service = Arc::new(QuestService::new(connection.clone(), clock.clone(), random));
        let subtask_service = Arc::new(SubtaskService::new(quest_service.clone()));
        let life_area_service = Arc::new(LifeAreaService::new(connection.clone(), clock.clone()));
        let reward_shop_service = Arc::new(RewardShopService::new(connection.clone(), clock.clone()));
        let user_service = Arc::new(UserService::new(connection, clock, quest_service.clone()));

        Self {
            quest_service,
            subtask_service,
            life_area_service,
            reward_shop_service,
            user_service,
        }
    }
}

/// Open the data directory, wire the services and seed first-run defaults
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Opening data directory {}", config.data_directory.display());
    let connection = CsvConnection::new(&config.data_directory)?;

    info!("Setting up domain services");
    let state = AppState::new(connection, Arc::new(SystemClock), Arc::new(ThreadRandom));
    state.user_service.initialize().await?;

    Ok(state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/quests", quest_apis::router())
        .nest("/subtasks", subtask_apis::router())
        .nest("/life-areas", life_area_apis::router())
        .nest("/rewards", reward_apis::router())
        .nest("/user", user_apis::router())
        .route("/dashboard", axum::routing::get(user_apis::get_dashboard));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
