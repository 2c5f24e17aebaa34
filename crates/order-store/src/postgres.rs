use async_trait::async_trait;
use common::OrderId;
use domain::{Money, Order, OrderError, OrderStats, StatsGroup};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use crate::{OrderQuery, OrderStore, Page, Result, StoreError};

/// PostgreSQL-backed order store implementation.
///
/// Orders are kept as JSONB documents; the columns used for filtering are
/// duplicated next to the document and kept in sync on every write.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the orders table and sequence if they do not exist yet.
    pub async fn bootstrap(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("../../../migrations/001_create_orders_table.sql"))
            .execute(&self.pool)
            .await?;
        tracing::info!("order store schema ready");
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let doc: serde_json::Value = row.try_get("doc")?;
        Ok(serde_json::from_value(doc)?)
    }

    fn row_to_group(row: PgRow) -> Result<StatsGroup> {
        let status: String = row.try_get("status")?;
        let order_type: String = row.try_get("order_type")?;
        let count: i64 = row.try_get("orders")?;
        let revenue: i64 = row.try_get("revenue")?;

        Ok(StatsGroup {
            status: status.parse().map_err(StoreError::InvalidRow)?,
            order_type: order_type.parse().map_err(StoreError::InvalidRow)?,
            count: count as u64,
            revenue: Money::from_cents(revenue),
        })
    }

    fn map_insert_error(order: &Order, err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.constraint() {
                Some("unique_order_code") => {
                    return StoreError::Duplicate(order.code().to_string());
                }
                Some("orders_pkey") => return StoreError::Duplicate(order.id().to_string()),
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Appends the WHERE clause for every filter set on `query`.
fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a OrderQuery) {
    builder.push(" WHERE 1=1");
    if let Some(ref user_id) = query.user_id {
        builder.push(" AND user_id = ").push_bind(user_id.as_str());
    }
    if let Some(ref restaurant_id) = query.restaurant_id {
        builder
            .push(" AND restaurant_id = ")
            .push_bind(restaurant_id.as_str());
    }
    if let Some(ref delivery_person_id) = query.delivery_person_id {
        builder
            .push(" AND delivery_person_id = ")
            .push_bind(delivery_person_id.as_str());
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(order_type) = query.order_type {
        builder.push(" AND order_type = ").push_bind(order_type.as_str());
    }
    if let Some(from) = query.created_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = query.created_to {
        builder.push(" AND created_at <= ").push_bind(to);
    }
}

/// Converts a row count for LIMIT/OFFSET. Values past `i64::MAX` select
/// nothing anyway, so they saturate.
fn to_sql_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn next_order_number(&self) -> Result<u64> {
        let next: i64 = sqlx::query_scalar("SELECT nextval('order_number_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(next as u64)
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id(), code = %order.code()))]
    async fn insert(&self, order: &Order) -> Result<()> {
        let doc = serde_json::to_value(order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, code, user_id, restaurant_id, delivery_person_id, status, order_type, total_amount_cents, created_at, updated_at, doc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.code().as_str())
        .bind(order.user_id().as_str())
        .bind(order.restaurant_id().as_str())
        .bind(order.delivery_person_id().map(|id| id.as_str()))
        .bind(order.status().as_str())
        .bind(order.order_type().as_str())
        .bind(order.total_amount().cents())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(order, e))?;

        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> = sqlx::query("SELECT doc FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn update<F, T>(&self, id: OrderId, mutate: F) -> Result<(Order, T)>
    where
        F: FnOnce(&mut Order) -> std::result::Result<T, OrderError> + Send,
        T: Send,
    {
        let start = std::time::Instant::now();
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent updates of the same order
        let row: Option<PgRow> = sqlx::query("SELECT doc FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        let stored = row
            .map(Self::row_to_order)
            .transpose()?
            .ok_or(StoreError::NotFound(id))?;

        let mut order = stored.clone();
        let value = mutate(&mut order)?;

        if order != stored {
            let doc = serde_json::to_value(&order)?;
            sqlx::query(
                r#"
                UPDATE orders
                SET delivery_person_id = $2, status = $3, updated_at = $4, doc = $5
                WHERE id = $1
                "#,
            )
            .bind(id.as_uuid())
            .bind(order.delivery_person_id().map(|p| p.as_str()))
            .bind(order.status().as_str())
            .bind(order.updated_at())
            .bind(doc)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        metrics::histogram!("order_store_update_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        Ok((order, value))
    }

    async fn query(&self, query: &OrderQuery) -> Result<Page<Order>> {
        if query.empty {
            return Ok(Page::empty());
        }

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_filters(&mut count, query);

        let mut select = QueryBuilder::new("SELECT doc FROM orders");
        push_filters(&mut select, query);
        select.push(" ORDER BY created_at DESC, code DESC");
        if let Some(limit) = query.limit {
            select.push(" LIMIT ").push_bind(to_sql_count(limit));
        }
        if let Some(offset) = query.offset {
            select.push(" OFFSET ").push_bind(to_sql_count(offset));
        }

        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        let rows = select.build().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total: total as u64,
        })
    }

    #[tracing::instrument(skip(self, query))]
    async fn stats(&self, query: &OrderQuery) -> Result<OrderStats> {
        if query.empty {
            return Ok(OrderStats::default());
        }

        let mut grouped = QueryBuilder::new(
            "SELECT status, order_type, COUNT(*) AS orders, \
             COALESCE(SUM(total_amount_cents), 0)::BIGINT AS revenue FROM orders",
        );
        push_filters(&mut grouped, query);
        grouped.push(" GROUP BY status, order_type");

        let rows = grouped.build().fetch_all(&self.pool).await?;
        let groups = rows
            .into_iter()
            .map(Self::row_to_group)
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderStats::from_groups(groups))
    }
}
