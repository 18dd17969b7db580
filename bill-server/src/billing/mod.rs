//! 账单模块
//!
//! - [`calc`] - 金额计算 (小计、税额、找零)
//! - [`BillLedger`] - 账单状态机与支付记录，唯一写入方
//! - [`BillingGateway`] - 面向请求的门面：查询、统计、待结账订单
//! - [`BillLocks`] - 按账单 ID 的单写者锁

pub mod calc;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod locks;

pub use error::{BillingError, BillingResult};
pub use gateway::{BillingGateway, DEFAULT_PAGE_SIZE};
pub use ledger::BillLedger;
pub use locks::{BillLockGuard, BillLocks};
