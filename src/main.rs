use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use account_backend::{
    AppState, app_router,
    cache::{KvStore, MemoryStore, RedisStore},
    config::{CacheType, Config, UserStoreType},
    database::{MemoryUserRepository, PgUserRepository, UserRepository},
    services::{HttpSmsSender, LogSmsSender, SmsSender},
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// 内存缓存清理过期键的间隔
const JANITOR_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env()?;

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 用户存储
    let users: Arc<dyn UserRepository> = match config.user_store {
        UserStoreType::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        conn.execute("SET application_name = 'account_backend';")
                            .await?;
                        Ok(())
                    })
                })
                .connect(url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Connected to Postgres, migrations applied");
            Arc::new(PgUserRepository::new(pool))
        }
        UserStoreType::Memory => {
            tracing::warn!("Using in-memory user store, data is lost on restart");
            Arc::new(MemoryUserRepository::new())
        }
    };

    // 键值存储
    let kv: Arc<dyn KvStore> = match config.cache_type {
        CacheType::Redis => {
            let url = config.redis_url.as_deref().unwrap_or_default();
            Arc::new(RedisStore::connect(url).await?)
        }
        CacheType::Memory => {
            let store = Arc::new(MemoryStore::new());
            store.spawn_janitor(JANITOR_INTERVAL);
            store
        }
    };

    // 短信通道
    let sender: Arc<dyn SmsSender> = match &config.sms_gateway_url {
        Some(url) => Arc::new(HttpSmsSender::new(url.as_str())?),
        None => {
            tracing::warn!("SMS_GATEWAY_URL not set, sms codes are only logged");
            Arc::new(LogSmsSender)
        }
    };

    let host = config.server_host.clone();
    let port = config.server_port;
    let state = AppState::new(config, users, kv, sender)?;
    let app = app_router(state);

    // 启动服务器
    let addr = SocketAddr::new(
        host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        port,
    );
    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
