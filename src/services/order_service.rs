use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    effects::best_effort,
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        sea_orm_active_enums::{NotificationType, OrderStatus, PaymentStatus, parse_enum},
    },
    error::{AppError, AppResult},
    mailer::{EmailLineItem, EmailTemplate, format_toman},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{
        load_user,
        notification_service::{self, NewNotification},
    },
    state::AppState,
};

const ORDER_NUMBER_ATTEMPTS: u32 = 3;
const ORDER_NUMBER_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A requested item after validation, with the unit price captured at
/// validation time.
#[derive(Debug, Clone)]
struct ValidatedLine {
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    unit_price: i64,
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Order items are required".into()));
    }
    if payload.shipping_address.trim().is_empty() {
        return Err(AppError::BadRequest("Shipping address is required".into()));
    }

    // Validation happens before any write so a rejected order leaves no trace.
    let mut lines = Vec::with_capacity(payload.items.len());
    let mut total_amount: i64 = 0;
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest("Quantity must be at least 1".into()));
        }

        let product = Products::find()
            .filter(
                Condition::all()
                    .add(ProdCol::Id.eq(item.product_id))
                    .add(ProdCol::IsActive.eq(true)),
            )
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", item.product_id)))?;

        if product.stock_quantity < item.quantity {
            return Err(AppError::InsufficientStock {
                product: product.name,
            });
        }

        total_amount = product
            .price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line_total| total_amount.checked_add(line_total))
            .ok_or_else(|| AppError::BadRequest("Order total is out of range".into()))?;

        lines.push(ValidatedLine {
            product_id: product.id,
            product_name: product.name,
            quantity: item.quantity,
            unit_price: product.price,
        });
    }

    let txn = state.orm.begin().await.map_err(order_failed)?;
    let (order, rows) = match write_order(&txn, user, &payload, &lines, total_amount).await {
        Ok(written) => {
            txn.commit().await.map_err(order_failed)?;
            written
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "order rollback failed");
            }
            return Err(err);
        }
    };

    // Built from the inserted rows: nothing is read back after the commit.
    let items: Vec<OrderItem> = rows
        .into_iter()
        .zip(&lines)
        .map(|(row, line)| OrderItem {
            product_name: Some(line.product_name.clone()),
            ..order_item_from_entity(row, None)
        })
        .collect();
    let order = order_from_entity(order);

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total_amount = order.total_amount,
        "order created"
    );

    let notify = notification_service::notify_user(
        state,
        NewNotification {
            user_id: user.user_id,
            notification_type: NotificationType::Order,
            title: "سفارش جدید".into(),
            message: format!(
                "سفارش شما با شماره {} ثبت شد. مبلغ کل: {} تومان",
                order.order_number,
                format_toman(order.total_amount)
            ),
            link: Some(format!("/profile/orders/{}", order.id)),
        },
    );
    let email = async {
        let buyer = load_user(state, user.user_id).await?;
        let template = EmailTemplate::OrderConfirmation {
            name: buyer.full_name,
            order_number: order.order_number.clone(),
            total_amount: order.total_amount,
            items: items
                .iter()
                .map(|item| EmailLineItem {
                    name: item.product_name.clone().unwrap_or_default(),
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            shipping_address: order.shipping_address.clone(),
        };
        state.mailer.send(&buyer.email, &template).await
    };
    tokio::join!(
        best_effort("order notification", notify),
        best_effort("order confirmation email", email),
    );

    Ok(ApiResponse::success(
        "Order created successfully",
        OrderWithItems { order, items },
        None,
    ))
}

/// Header, line items and stock decrements; runs entirely inside `txn`.
async fn write_order(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    payload: &CreateOrderRequest,
    lines: &[ValidatedLine],
    total_amount: i64,
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    let order = insert_order_header(txn, user, payload, total_amount)
        .await
        .map_err(order_failed)?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut rows = Vec::with_capacity(lines.len());

    for line in lines {
        let row = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(order_failed)?;
        rows.push(row);

        // Check and decrement in one statement: a concurrent order that drained
        // the stock since validation leaves zero rows affected.
        let result = Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(line.quantity),
            )
            .col_expr(ProdCol::UpdatedAt, Expr::value(now))
            .filter(ProdCol::Id.eq(line.product_id))
            .filter(ProdCol::StockQuantity.gte(line.quantity))
            .exec(txn)
            .await
            .map_err(order_failed)?;

        if result.rows_affected == 0 {
            return Err(AppError::InsufficientStock {
                product: line.product_name.clone(),
            });
        }
    }

    Ok((order, rows))
}

/// Inserts the order header, retrying with a fresh order number when the
/// unique index rejects a collision. Each attempt runs in its own savepoint so
/// a failed insert does not poison the surrounding transaction.
async fn insert_order_header(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    payload: &CreateOrderRequest,
    total_amount: i64,
) -> Result<OrderModel, DbErr> {
    let order_id = Uuid::new_v4();
    let now = Utc::now();
    let mut attempt = 1;

    loop {
        let savepoint = txn.begin().await?;
        let header = OrderActive {
            id: Set(order_id),
            user_id: Set(user.user_id),
            order_number: Set(generate_order_number()),
            total_amount: Set(total_amount),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            shipping_address: Set(payload.shipping_address.clone()),
            payment_method: Set(payload.payment_method.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match header.insert(&savepoint).await {
            Ok(order) => {
                savepoint.commit().await?;
                return Ok(order);
            }
            Err(err) => {
                savepoint.rollback().await?;
                let collision = matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)));
                if !collision || attempt >= ORDER_NUMBER_ATTEMPTS {
                    return Err(err);
                }
                tracing::warn!(attempt, "order number collision, retrying");
                attempt += 1;
            }
        }
    }
}

/// `ORD-<unix millis>-<9 random base36 chars>`
pub fn generate_order_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}

fn order_failed<E: std::fmt::Display>(err: E) -> AppError {
    tracing::error!(error = %err, "order write failed");
    AppError::OrderFailed
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.normalize();
    let finder = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    let items = load_items(state, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        None,
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let status = match payload.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            parse_enum::<OrderStatus>(raw)
                .ok_or_else(|| AppError::BadRequest("Invalid status".into()))?,
        ),
        None => None,
    };
    let payment_status = match payload.payment_status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            parse_enum::<PaymentStatus>(raw)
                .ok_or_else(|| AppError::BadRequest("Invalid payment status".into()))?,
        ),
        None => None,
    };
    if status.is_none() && payment_status.is_none() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    let mut active: OrderActive = existing.into();
    if let Some(status) = status.clone() {
        active.status = Set(status);
    }
    if let Some(payment_status) = payment_status {
        active.payment_status = Set(payment_status);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Some(status) = status {
        let owner_id = order.user_id;
        let order_number = order.order_number.clone();
        best_effort("order status email", async {
            let owner = load_user(state, owner_id).await?;
            let template = EmailTemplate::OrderStatusUpdate {
                name: owner.full_name,
                order_number,
                status,
            };
            state.mailer.send(&owner.email, &template).await
        })
        .await;
    }

    Ok(ApiResponse::success(
        "Order updated successfully",
        order_from_entity(order),
        None,
    ))
}

async fn load_items(state: &AppState, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .order_by_asc(OrderItemCol::Id)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(item, product)| order_item_from_entity(item, product))
        .collect())
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        order_number: model.order_number,
        total_amount: model.total_amount,
        status: model.status,
        payment_status: model.payment_status,
        shipping_address: model.shipping_address,
        payment_method: model.payment_method,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel, product: Option<ProductModel>) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        product_name: product.map(|p| p.name),
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
