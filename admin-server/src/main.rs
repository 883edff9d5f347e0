use admin_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment()?;

    // 打印横幅
    print_banner();

    tracing::info!("🚕 CityHop Admin Server starting...");

    // 2. 加载配置 (SESSION_SECRET / DATABASE_PATH 缺失直接失败)
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    // 3. 初始化服务器状态 (数据库 + 种子数据)
    let state = match ServerState::initialize(&config).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Initialization error: {}", e);
            return Err(e.into());
        }
    };

    // 4. 启动 HTTP 服务器
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
