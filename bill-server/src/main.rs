use bill_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载 .env (不存在时忽略)
    let _ = dotenv::dotenv();

    // 2. 加载配置
    let config = Config::from_env();

    // 3. 初始化日志
    setup_environment(&config)?;

    print_banner();
    tracing::info!(
        environment = %config.environment,
        database = %config.database_path,
        "🧾 Bill Server starting..."
    );

    // 4. 初始化服务器状态
    let state = ServerState::initialize(&config).await?;

    // 5. 启动 HTTP 服务器
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
