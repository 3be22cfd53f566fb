use foodbee::{config::AppConfig, db::create_orm_conn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("info"))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    sqlx::migrate!("./migrations")
        .run(orm.get_postgres_connection_pool())
        .await?;
    println!("Migrations applied");
    Ok(())
}
