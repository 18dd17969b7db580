//! Bill API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/bills | GET | 账单列表 (过滤 + 分页) |
//! | /api/bills | POST | 从订单生成账单 |
//! | /api/bills/completed-orders | GET | 已完成但未结账的订单 |
//! | /api/bills/statistics | GET | 账单统计 |
//! | /api/bills/{id} | GET | 单个账单 |
//! | /api/bills/{id} | DELETE | 删除草稿账单 |
//! | /api/bills/{id}/payment | POST | 记录一笔支付 |
//! | /api/bills/{id}/mark-printed | POST | 标记已打印 |
//! | /api/bills/{id}/cancel | POST | 取消 (draft → cancelled) |
//! | /api/bills/{id}/finalize | POST | 确认 (draft → generated) |
//! | /api/bills/{id}/refund | POST | 退款 (paid → refunded) |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/bills", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/completed-orders", get(handler::completed_orders))
        .route("/statistics", get(handler::statistics))
        .route("/{id}", get(handler::get_by_id));

    let write_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", axum::routing::delete(handler::delete))
        .route("/{id}/payment", post(handler::record_payment))
        .route("/{id}/mark-printed", post(handler::mark_printed))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/finalize", post(handler::finalize))
        .route("/{id}/refund", post(handler::refund));

    read_routes.merge(write_routes)
}
