mod activity;
mod aging;
mod config;
mod error;
mod front;
mod listing;
mod migration;
pub mod models;
mod notifications;
mod session;
mod stats;
mod users;

use env_logger::Env;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::try_init_from_env(Env::default().default_filter_or("findash=debug"))?;

    let cfg = AppConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.url)
        .await?;
    log::info!("connected to database");

    migration::migrate(&pool, &cfg.web.migrations_dir).await?;
    front::start_web_server(pool, &cfg).await
}
