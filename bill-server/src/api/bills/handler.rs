//! 账单 API 处理器

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::bad_request;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult};
use shared::models::{
    Bill, BillCreate, BillFilters, BillStatistics, BillStatus, OrderSnapshot, PaymentInstruction,
    PaymentStatus, StatisticsRange,
};
use shared::money::fixed2;

/// 列表查询参数 (空值视为未设置)
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    status: Option<String>,
    payment_status: Option<String>,
    date_from: Option<String>,
    date_to: Option<String>,
    search: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

impl TryFrom<ListQuery> for BillFilters {
    type Error = AppError;

    fn try_from(q: ListQuery) -> Result<Self, Self::Error> {
        Ok(BillFilters {
            status: parse_param::<BillStatus>(q.status, "status")?,
            payment_status: parse_param::<PaymentStatus>(q.payment_status, "payment_status")?,
            date_from: present(q.date_from),
            date_to: present(q.date_to),
            search: present(q.search),
            limit: parse_param::<i64>(q.limit, "limit")?,
            offset: parse_param::<i64>(q.offset, "offset")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    date_from: Option<String>,
    date_to: Option<String>,
}

/// 列表分页信息 (`meta`)
#[derive(Debug, Serialize)]
struct PageMeta {
    total: i64,
    limit: i64,
    offset: i64,
}

/// `POST /api/bills/{id}/payment` 响应: 统一包装 + 本次找零
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    #[serde(flatten)]
    envelope: ApiResponse<Bill>,
    #[serde(with = "fixed2")]
    change_amount: Decimal,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_param<T: FromStr>(value: Option<String>, field: &str) -> AppResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    present(value)
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| {
                AppError::validation(format!("Invalid {field}: {e}")).with_detail("field", field)
            })
        })
        .transpose()
}

fn bill_id(path: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    path.map(|Path(id)| id).map_err(bad_request)
}

/// GET /api/bills - 账单列表
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<ApiResponse<Vec<Bill>>> {
    let Query(query) = query.map_err(bad_request)?;
    let page = state.gateway().list_bills(query.try_into()?).await?;
    let meta = PageMeta {
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    };
    Ok(ApiResponse::success(page.bills).with_meta(meta))
}

/// GET /api/bills/completed-orders - 已完成且未结账的订单
pub async fn completed_orders(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<Vec<OrderSnapshot>>> {
    let orders = state.gateway().completed_orders_awaiting_billing().await?;
    Ok(ApiResponse::success(orders))
}

/// GET /api/bills/statistics - 账单统计
pub async fn statistics(
    State(state): State<ServerState>,
    query: Result<Query<StatisticsQuery>, QueryRejection>,
) -> AppResult<ApiResponse<BillStatistics>> {
    let Query(query) = query.map_err(bad_request)?;
    let range = StatisticsRange {
        date_from: present(query.date_from),
        date_to: present(query.date_to),
    };
    let stats = state.gateway().compute_statistics(range).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/bills/{id} - 获取单个账单
pub async fn get_by_id(
    State(state): State<ServerState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<ApiResponse<Bill>> {
    let bill = state.gateway().get_bill(bill_id(path)?).await?;
    Ok(ApiResponse::success(bill))
}

/// POST /api/bills - 从订单生成账单
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<BillCreate>, JsonRejection>,
) -> AppResult<ApiResponse<Bill>> {
    let Json(payload) = payload.map_err(bad_request)?;
    let bill = state
        .gateway()
        .generate_bill(payload.order_id, payload.options)
        .await?;
    Ok(ApiResponse::success_with_message(
        format!("Bill {} generated", bill.bill_number),
        bill,
    ))
}

/// POST /api/bills/{id}/payment - 记录支付
pub async fn record_payment(
    State(state): State<ServerState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PaymentInstruction>, JsonRejection>,
) -> AppResult<Json<PaymentResponse>> {
    let id = bill_id(path)?;
    let Json(instruction) = payload.map_err(bad_request)?;
    let receipt = state.gateway().record_payment(id, instruction).await?;

    let message = if receipt.bill.status == BillStatus::Paid {
        "Bill paid"
    } else {
        "Partial payment recorded"
    };
    Ok(Json(PaymentResponse {
        envelope: ApiResponse::success_with_message(message, receipt.bill),
        change_amount: receipt.change_amount,
    }))
}

/// POST /api/bills/{id}/mark-printed - 标记已打印
pub async fn mark_printed(
    State(state): State<ServerState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<ApiResponse<Bill>> {
    let bill = state.gateway().mark_printed(bill_id(path)?).await?;
    Ok(ApiResponse::success(bill))
}

/// POST /api/bills/{id}/cancel - 取消草稿账单
pub async fn cancel(
    State(state): State<ServerState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<ApiResponse<Bill>> {
    let bill = state.gateway().cancel_bill(bill_id(path)?).await?;
    Ok(ApiResponse::success_with_message("Bill cancelled", bill))
}

/// POST /api/bills/{id}/finalize - 确认草稿账单
pub async fn finalize(
    State(state): State<ServerState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<ApiResponse<Bill>> {
    let bill = state.gateway().finalize_bill(bill_id(path)?).await?;
    Ok(ApiResponse::success_with_message("Bill finalized", bill))
}

/// POST /api/bills/{id}/refund - 退款
pub async fn refund(
    State(state): State<ServerState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<ApiResponse<Bill>> {
    let bill = state.gateway().refund_bill(bill_id(path)?).await?;
    Ok(ApiResponse::success_with_message("Bill refunded", bill))
}

/// DELETE /api/bills/{id} - 删除草稿账单
pub async fn delete(
    State(state): State<ServerState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<ApiResponse<()>> {
    let id = bill_id(path)?;
    state.gateway().delete_bill(id).await?;
    Ok(ApiResponse::ok(format!("Bill {id} deleted")))
}
