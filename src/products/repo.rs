use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Product record. `user_id` is set once at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub amount: i64,
    pub created_at: OffsetDateTime,
}

// Every query below is scoped by owner. A row belonging to someone else
// reads as absent, so "not found" and "not owned" are indistinguishable
// to callers.
impl Product {
    pub async fn list_by_owner(db: &PgPool, owner: Uuid) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, user_id, name, description, amount, created_at
            FROM products
            WHERE user_id = $1
            "#,
        )
        .bind(owner)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_owned(db: &PgPool, owner: Uuid, id: i64) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, user_id, name, description, amount, created_at
            FROM products
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    pub async fn insert(
        db: &PgPool,
        owner: Uuid,
        name: &str,
        description: &str,
        amount: i64,
    ) -> anyhow::Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (user_id, name, description, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, description, amount, created_at
            "#,
        )
        .bind(owner)
        .bind(name)
        .bind(description)
        .bind(amount)
        .fetch_one(db)
        .await?;
        Ok(product)
    }

    /// Writes all three fields unconditionally. Returns None when the row
    /// does not exist for this owner.
    pub async fn update_owned(
        db: &PgPool,
        owner: Uuid,
        id: i64,
        name: &str,
        description: &str,
        amount: i64,
    ) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $3, description = $4, amount = $5
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, description, amount, created_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(name)
        .bind(description)
        .bind(amount)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    /// Returns false when nothing was deleted (missing or not owned).
    pub async fn delete_owned(db: &PgPool, owner: Uuid, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM products
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::User;

    async fn user(db: &PgPool, name: &str, email: &str) -> User {
        User::insert(db, name, email, "$argon2id$v=19$fake")
            .await
            .expect("insert user")
    }

    #[sqlx::test]
    async fn create_then_find_round_trips(db: PgPool) {
        let ann = user(&db, "Ann", "ann@x.com").await;
        let created = Product::insert(&db, ann.id, "Phone", "d", 500)
            .await
            .expect("insert product");

        let found = Product::find_owned(&db, ann.id, created.id)
            .await
            .expect("find")
            .expect("product exists for its owner");
        assert_eq!(found.id, created.id);
        assert_eq!(found.user_id, ann.id);
        assert_eq!(found.name, "Phone");
        assert_eq!(found.description, "d");
        assert_eq!(found.amount, 500);
    }

    #[sqlx::test]
    async fn products_are_invisible_across_owners(db: PgPool) {
        let ann = user(&db, "Ann", "ann@x.com").await;
        let bob = user(&db, "Bob", "bob@x.com").await;
        let product = Product::insert(&db, ann.id, "Phone", "d", 500)
            .await
            .expect("insert product");

        // Bob reads, rewrites and deletes against Ann's id; every path
        // reports the row as absent.
        assert!(Product::find_owned(&db, bob.id, product.id)
            .await
            .expect("find")
            .is_none());
        assert!(Product::update_owned(&db, bob.id, product.id, "Hijack", "x", 1)
            .await
            .expect("update")
            .is_none());
        assert!(!Product::delete_owned(&db, bob.id, product.id)
            .await
            .expect("delete"));
        assert!(Product::list_by_owner(&db, bob.id)
            .await
            .expect("list")
            .is_empty());

        // Ann's row is untouched by any of it.
        let still = Product::find_owned(&db, ann.id, product.id)
            .await
            .expect("find")
            .expect("owner still sees the row");
        assert_eq!(still.name, "Phone");
        assert_eq!(still.amount, 500);
    }

    #[sqlx::test]
    async fn list_returns_only_the_callers_rows(db: PgPool) {
        let ann = user(&db, "Ann", "ann@x.com").await;
        let bob = user(&db, "Bob", "bob@x.com").await;
        Product::insert(&db, ann.id, "Phone", "d", 500).await.expect("insert");
        Product::insert(&db, ann.id, "Laptop", "d", 900).await.expect("insert");
        Product::insert(&db, bob.id, "Chair", "d", 40).await.expect("insert");

        let anns = Product::list_by_owner(&db, ann.id).await.expect("list");
        assert_eq!(anns.len(), 2);
        assert!(anns.iter().all(|p| p.user_id == ann.id));

        let bobs = Product::list_by_owner(&db, bob.id).await.expect("list");
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].name, "Chair");
    }

    #[sqlx::test]
    async fn update_writes_all_three_fields(db: PgPool) {
        let ann = user(&db, "Ann", "ann@x.com").await;
        let product = Product::insert(&db, ann.id, "Phone", "d", 500)
            .await
            .expect("insert");

        let updated = Product::update_owned(&db, ann.id, product.id, "Phone 2", "newer", 600)
            .await
            .expect("update")
            .expect("row exists");
        assert_eq!(updated.id, product.id);
        assert_eq!(updated.user_id, ann.id);
        assert_eq!(updated.name, "Phone 2");
        assert_eq!(updated.description, "newer");
        assert_eq!(updated.amount, 600);
    }

    #[sqlx::test]
    async fn delete_removes_the_row(db: PgPool) {
        let ann = user(&db, "Ann", "ann@x.com").await;
        let product = Product::insert(&db, ann.id, "Phone", "d", 500)
            .await
            .expect("insert");

        assert!(Product::delete_owned(&db, ann.id, product.id).await.expect("delete"));
        assert!(Product::find_owned(&db, ann.id, product.id)
            .await
            .expect("find")
            .is_none());
        // Second delete finds nothing.
        assert!(!Product::delete_owned(&db, ann.id, product.id).await.expect("delete"));
    }
}
