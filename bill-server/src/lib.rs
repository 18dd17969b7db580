//! Bill Server - 餐厅账单与支付对账服务
//!
//! # 架构概述
//!
//! - **账单** (`billing`): 金额计算、账单状态机、支付记录、统计
//! - **订单快照** (`orders`): 生成账单时读取订单的只读视图
//! - **数据库** (`db`): SQLite (WAL) + 嵌入式迁移
//! - **HTTP API** (`api`): `/api/bills` 与 `/api/health`
//!
//! # 模块结构
//!
//! ```text
//! bill-server/src/
//! ├── core/          # 配置、状态、服务器、中间件
//! ├── billing/       # ledger、gateway、金额计算、错误
//! ├── orders/        # 订单快照提供者
//! ├── db/            # 连接池和 repository
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、时间、校验
//! ```

pub mod api;
pub mod billing;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use billing::{BillLedger, BillingError, BillingGateway};
pub use crate::core::{Config, Server, ServerState, build_app};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger};

/// 按配置初始化日志 (生产环境输出 JSON)
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    init_logger(
        &config.log_level,
        config.is_production(),
        config.log_dir.as_deref(),
    )
}

pub fn print_banner() {
    println!(
        r#"
    ____  _ ____   _____
   / __ )(_) / /  / ___/___  ______   _____  _____
  / __  / / / /   \__ \/ _ \/ ___/ | / / _ \/ ___/
 / /_/ / / / /   ___/ /  __/ /   | |/ /  __/ /
/_____/_/_/_/   /____/\___/_/    |___/\___/_/
    "#
    );
}
