//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查 (含数据库探测)
//! - [`bills`] - 账单查询、生成、支付与状态流转

pub mod bills;
pub mod health;

use axum::Router;
use axum::response::IntoResponse;

use crate::core::ServerState;
use crate::utils::{AppError, ErrorCode};

/// 注册全部路由 (不含中间件和状态)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(bills::router())
        .fallback(not_found)
}

async fn not_found(uri: http::Uri) -> impl IntoResponse {
    AppError::with_message(ErrorCode::NotFound, format!("No route for {}", uri.path()))
}

/// 将提取器错误转换为统一错误响应
pub(crate) fn bad_request(rejection: impl std::fmt::Display) -> AppError {
    AppError::invalid(rejection.to_string())
}
