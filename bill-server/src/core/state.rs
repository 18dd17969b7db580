use std::sync::Arc;
use std::time::Instant;

use sqlx::SqlitePool;

use crate::billing::{BillLedger, BillingGateway};
use crate::core::{Config, Result};
use crate::db::DbService;
use crate::db::repository::{BillRepository, SqliteBillRepository};
use crate::orders::SqliteOrderProvider;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求 clone 一次。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | gateway | Arc<BillingGateway> | 账单门面 (内含 ledger 与单写者锁) |
/// | started_at | Instant | 启动时间，用于健康检查 uptime |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// 账单门面
    pub gateway: Arc<BillingGateway>,
    /// 启动时间
    pub started_at: Instant,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 打开数据库 (WAL + 迁移)，然后组装 repository → ledger → gateway
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self::with_pool(config.clone(), db.pool))
    }

    /// 使用已有连接池组装状态 (测试用)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let repo: Arc<dyn BillRepository> = Arc::new(SqliteBillRepository::new(pool.clone()));
        let ledger = Arc::new(BillLedger::new(
            repo.clone(),
            config.default_tax_rate,
            config.timezone,
        ));
        let gateway = Arc::new(BillingGateway::new(
            ledger,
            repo,
            Arc::new(SqliteOrderProvider::new(pool.clone())),
            config.timezone,
            config.max_page_size,
        ));

        tracing::info!(
            default_tax_rate = %config.default_tax_rate,
            timezone = %config.timezone,
            "Billing services ready"
        );

        Self {
            config,
            pool,
            gateway,
            started_at: Instant::now(),
        }
    }

    /// 账单门面
    pub fn gateway(&self) -> &BillingGateway {
        &self.gateway
    }

    /// 运行时间 (秒)
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
