use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 服务器配置 - 账单服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATABASE_PATH | ./data/billing.db | SQLite 数据库文件 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | DEFAULT_TAX_RATE | 8.0 | 默认税率 (百分比) |
/// | TIMEZONE | Europe/Madrid | 业务时区 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志文件目录 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | MAX_PAGE_SIZE | 200 | 列表接口单页上限 |
///
/// # 示例
///
/// ```ignore
/// DATABASE_PATH=/data/billing.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 数据库文件路径
    pub database_path: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 生成账单时的默认税率 (百分比)
    pub default_tax_rate: Decimal,
    /// 业务时区，用于日期过滤、"今日"统计和账单编号
    pub timezone: Tz,
    /// 日志级别 (EnvFilter 语法)
    pub log_level: String,
    /// 日志文件目录，未设置时只输出到 stdout
    pub log_dir: Option<String>,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 列表接口单页最大条数
    pub max_page_size: i64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/billing.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            default_tax_rate: std::env::var("DEFAULT_TAX_RATE")
                .ok()
                .and_then(|v| Decimal::from_str(v.trim()).ok())
                .filter(|rate| !rate.is_sign_negative())
                .unwrap_or_else(|| Decimal::new(80, 1)),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::Europe::Madrid),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            max_page_size: std::env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|n: &i64| *n > 0)
                .unwrap_or(200),
        }
    }

    /// 使用自定义数据库路径覆盖配置
    ///
    /// 常用于测试场景
    pub fn with_database(database_path: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_database_keeps_defaults() {
        let config = Config::with_database("/tmp/x.db");
        assert_eq!(config.database_path, "/tmp/x.db");
        assert!(config.max_page_size > 0);
        assert!(!config.default_tax_rate.is_sign_negative());
    }
}
