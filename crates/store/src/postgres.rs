//! PostgreSQL-backed store implementation.

use async_trait::async_trait;
use chrono::Utc;
use common::{CategoryId, LineItemId, Money, OrderId, ProductId, UserId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::crud::{Categories, Orders, Products, Users};
use crate::error::{Result, StoreError};
use crate::records::{
    CategoryPatch, CategoryRecord, LineItemFields, LineItemRecord, NewCategory, NewLineItem,
    NewOrder, NewProduct, NewUser, OrderPatch, OrderRecord, ProductPatch, ProductRecord,
    UserPatch, UserRecord,
};
use crate::repository::{CatalogLookup, LineItems, OrderTotals, StockLedger};
use crate::tx::TxStore;

/// PostgreSQL store.
///
/// All engine-facing operations run inside a caller-held
/// [`Transaction`]; per-row serialization comes from the `FOR UPDATE`
/// locks taken by the lookup queries, so a concurrent operation against
/// the same product or order blocks until the first transaction settles.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn row_to_user(row: PgRow) -> Result<UserRecord> {
        Ok(UserRecord {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_category(row: PgRow) -> Result<CategoryRecord> {
        Ok(CategoryRecord {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price")?),
            quantity_in_stock: row.try_get("quantity_in_stock")?,
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            total_price: Money::from_cents(row.try_get("total_price")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_line_item(row: PgRow) -> Result<LineItemRecord> {
        Ok(LineItemRecord {
            id: LineItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            unit_price: Money::from_cents(row.try_get("unit_price")?),
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl TxStore for PostgresStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl StockLedger for PostgresStore {
    async fn reserve(
        &self,
        tx: &mut Self::Tx,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<i64> {
        let available: Option<i64> =
            sqlx::query_scalar("SELECT quantity_in_stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id.as_uuid())
                .fetch_optional(&mut **tx)
                .await?;

        let available = available.ok_or(StoreError::ProductNotFound(product_id))?;
        if i64::from(quantity) > available {
            return Err(StoreError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            });
        }

        // Guarded decrement; the row lock above makes the check-then-write
        // race-free, the WHERE clause keeps the stock invariant even if a
        // caller skips the lookup.
        let new_stock: i64 = sqlx::query_scalar(
            r#"
            UPDATE products
            SET quantity_in_stock = quantity_in_stock - $2
            WHERE id = $1 AND quantity_in_stock >= $2
            RETURNING quantity_in_stock
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_one(&mut **tx)
        .await?;

        Ok(new_stock)
    }

    async fn release(
        &self,
        tx: &mut Self::Tx,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<i64> {
        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET quantity_in_stock = quantity_in_stock + $2
            WHERE id = $1
            RETURNING quantity_in_stock
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&mut **tx)
        .await?;

        new_stock.ok_or(StoreError::ProductNotFound(product_id))
    }
}

#[async_trait]
impl OrderTotals for PostgresStore {
    async fn adjust(&self, tx: &mut Self::Tx, order_id: OrderId, delta: Money) -> Result<()> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            "UPDATE orders SET total_price = total_price + $2 WHERE id = $1 RETURNING id",
        )
        .bind(order_id.as_uuid())
        .bind(delta.cents())
        .fetch_optional(&mut **tx)
        .await?;

        updated
            .map(|_| ())
            .ok_or(StoreError::OrderNotFound(order_id))
    }
}

#[async_trait]
impl LineItems for PostgresStore {
    async fn insert(&self, tx: &mut Self::Tx, item: NewLineItem) -> Result<LineItemRecord> {
        let record = LineItemRecord {
            id: LineItemId::new(),
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO line_items (id, order_id, product_id, quantity, unit_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.order_id.as_uuid())
        .bind(record.product_id.as_uuid())
        .bind(i64::from(record.quantity))
        .bind(record.unit_price.cents())
        .bind(record.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(record)
    }

    async fn fetch(&self, tx: &mut Self::Tx, id: LineItemId) -> Result<Option<LineItemRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price, created_at
            FROM line_items
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Self::row_to_line_item).transpose()
    }

    async fn replace(
        &self,
        tx: &mut Self::Tx,
        id: LineItemId,
        fields: LineItemFields,
    ) -> Result<LineItemRecord> {
        let row = sqlx::query(
            r#"
            UPDATE line_items
            SET order_id = $2, product_id = $3, quantity = $4, unit_price = $5
            WHERE id = $1
            RETURNING id, order_id, product_id, quantity, unit_price, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(fields.order_id.as_uuid())
        .bind(fields.product_id.as_uuid())
        .bind(i64::from(fields.quantity))
        .bind(fields.unit_price.cents())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Self::row_to_line_item)
            .transpose()?
            .ok_or(StoreError::LineItemNotFound(id))
    }

    async fn remove(&self, tx: &mut Self::Tx, id: LineItemId) -> Result<Option<LineItemRecord>> {
        let row = sqlx::query(
            r#"
            DELETE FROM line_items
            WHERE id = $1
            RETURNING id, order_id, product_id, quantity, unit_price, created_at
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Self::row_to_line_item).transpose()
    }

    async fn find(&self, id: LineItemId) -> Result<Option<LineItemRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price, created_at
            FROM line_items
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_line_item).transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<LineItemRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price, created_at
            FROM line_items
            ORDER BY created_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_line_item).collect()
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM line_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_by_order(&self, order_id: OrderId) -> Result<Vec<LineItemRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price, created_at
            FROM line_items
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_line_item).collect()
    }
}

#[async_trait]
impl CatalogLookup for PostgresStore {
    async fn lookup_order(&self, tx: &mut Self::Tx, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, customer_name, customer_email, total_price, created_at
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn lookup_product(
        &self,
        tx: &mut Self::Tx,
        id: ProductId,
    ) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price, quantity_in_stock, category_id, user_id, created_at
            FROM products
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Self::row_to_product).transpose()
    }
}

#[async_trait]
impl Users for PostgresStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        let record = UserRecord {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES ($1, $2, $3, $4)")
            .bind(record.id.as_uuid())
            .bind(&record.name)
            .bind(&record.email)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.constraint() == Some("users_email_key")
                {
                    return StoreError::EmailTaken(record.email.clone());
                }
                StoreError::from(e)
            })?;

        Ok(record)
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, created_at
            FROM users
            ORDER BY created_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name), email = COALESCE($3, email)
            WHERE id = $1
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.name)
        .bind(patch.email.clone())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some("users_email_key")
            {
                return StoreError::EmailTaken(patch.email.unwrap_or_default());
            }
            StoreError::from(e)
        })?;

        row.map(Self::row_to_user).transpose()
    }

    async fn remove_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "DELETE FROM users WHERE id = $1 RETURNING id, name, email, created_at",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl Categories for PostgresStore {
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord> {
        let record = CategoryRecord {
            id: CategoryId::new(),
            name: category.name,
            description: category.description,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(record.id.as_uuid())
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn fetch_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let row =
            sqlx::query("SELECT id, name, description, created_at FROM categories WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_category).transpose()
    }

    async fn fetch_category_by_name(&self, needle: &str) -> Result<Option<CategoryRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, created_at
            FROM categories
            WHERE name LIKE '%' || $1 || '%'
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(needle)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_category).transpose()
    }

    async fn list_categories(&self, limit: i64, offset: i64) -> Result<Vec<CategoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, created_at
            FROM categories
            ORDER BY created_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_category).collect()
    }

    async fn count_categories(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Option<CategoryRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name), description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.name)
        .bind(patch.description)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_category).transpose()
    }

    async fn remove_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let row = sqlx::query(
            "DELETE FROM categories WHERE id = $1 RETURNING id, name, description, created_at",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_category).transpose()
    }
}

#[async_trait]
impl Products for PostgresStore {
    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord> {
        let record = ProductRecord {
            id: ProductId::new(),
            name: product.name,
            description: product.description,
            price: product.price,
            quantity_in_stock: product.quantity_in_stock,
            category_id: product.category_id,
            user_id: product.user_id,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, description, price, quantity_in_stock, category_id, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.price.cents())
        .bind(record.quantity_in_stock)
        .bind(record.category_id.as_uuid())
        .bind(record.user_id.as_uuid())
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price, quantity_in_stock, category_id, user_id, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, limit: i64, offset: i64) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, quantity_in_stock, category_id, user_id, created_at
            FROM products
            ORDER BY created_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn count_products(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_products_by_user(&self, user_id: UserId) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, quantity_in_stock, category_id, user_id, created_at
            FROM products
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, quantity_in_stock, category_id, user_id, created_at
            FROM products
            WHERE category_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(category_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                quantity_in_stock = COALESCE($5, quantity_in_stock),
                category_id = COALESCE($6, category_id)
            WHERE id = $1
            RETURNING id, name, description, price, quantity_in_stock, category_id, user_id, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price.map(|p| p.cents()))
        .bind(patch.quantity_in_stock)
        .bind(patch.category_id.map(|c| c.as_uuid()))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn remove_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r#"
            DELETE FROM products
            WHERE id = $1
            RETURNING id, name, description, price, quantity_in_stock, category_id, user_id, created_at
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }
}

#[async_trait]
impl Orders for PostgresStore {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord> {
        let record = OrderRecord {
            id: OrderId::new(),
            user_id: order.user_id,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            total_price: Money::zero(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, customer_name, customer_email, total_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_uuid())
        .bind(&record.customer_name)
        .bind(&record.customer_email)
        .bind(record.total_price.cents())
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, customer_name, customer_email, total_price, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self, limit: i64, offset: i64) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, customer_name, customer_email, total_price, created_at
            FROM orders
            ORDER BY created_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn count_orders(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, customer_name, customer_email, total_price, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_order(&self, id: OrderId, patch: OrderPatch) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET user_id = COALESCE($2, user_id),
                customer_name = COALESCE($3, customer_name),
                customer_email = COALESCE($4, customer_email),
                total_price = COALESCE($5, total_price)
            WHERE id = $1
            RETURNING id, user_id, customer_name, customer_email, total_price, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.user_id.map(|u| u.as_uuid()))
        .bind(patch.customer_name)
        .bind(patch.customer_email)
        .bind(patch.total_price.map(|p| p.cents()))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn remove_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(
            r#"
            DELETE FROM orders
            WHERE id = $1
            RETURNING id, user_id, customer_name, customer_email, total_price, created_at
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }
}
