use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::category::NewCategory;
use crate::error::{Result, StorageError};
use crate::models::Category;

const CATEGORY_COLUMNS: &str =
    "category_id, race_id, name, distance_km, sex, age_min, age_max, is_active, created_at";

// Matching breaks ties by position, so this order must stay deterministic.
const CATEGORY_ORDER: &str = "ORDER BY distance_km, age_min NULLS FIRST, name, category_id";

pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_race(&self, race_id: Uuid) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE race_id = $1 {CATEGORY_ORDER}"
        ))
        .bind(race_id)
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Active categories only, in matching order
    pub async fn list_active_by_race(&self, race_id: Uuid) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE race_id = $1 AND is_active {CATEGORY_ORDER}"
        ))
        .bind(race_id)
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn find(&self, race_id: Uuid, category_id: Uuid) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE race_id = $1 AND category_id = $2"
        ))
        .bind(race_id)
        .bind(category_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn create(&self, race_id: Uuid, category: &NewCategory) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (race_id, name, distance_km, sex, age_min, age_max, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(race_id)
        .bind(&category.name)
        .bind(category.distance_km)
        .bind(category.sex)
        .bind(category.age_min)
        .bind(category.age_max)
        .bind(category.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| StorageError::from(e).constraint("Invalid category for this race"))
    }

    /// Insert several categories in one statement
    pub async fn create_many(&self, race_id: Uuid, categories: &[NewCategory]) -> Result<Vec<Category>> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Postgres>::new(
            "INSERT INTO categories (race_id, name, distance_km, sex, age_min, age_max, is_active) ",
        );
        query.push_values(categories, |mut row, category| {
            row.push_bind(race_id)
                .push_bind(&category.name)
                .push_bind(category.distance_km)
                .push_bind(category.sex)
                .push_bind(category.age_min)
                .push_bind(category.age_max)
                .push_bind(category.is_active);
        });
        query.push(" RETURNING ");
        query.push(CATEGORY_COLUMNS);

        let created = query
            .build_query_as::<Category>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| StorageError::from(e).constraint("Invalid category for this race"))?;

        Ok(created)
    }

    pub async fn update(&self, existing: &Category, category: &NewCategory) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = $2, distance_km = $3, sex = $4, age_min = $5, age_max = $6, is_active = $7
            WHERE category_id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(existing.category_id)
        .bind(&category.name)
        .bind(category.distance_km)
        .bind(category.sex)
        .bind(category.age_min)
        .bind(category.age_max)
        .bind(category.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Flip `is_active` and return the updated row
    pub async fn toggle_active(&self, race_id: Uuid, category_id: Uuid) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET is_active = NOT is_active
            WHERE race_id = $1 AND category_id = $2
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(race_id)
        .bind(category_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Participants pointing at the category fall back to uncategorized
    pub async fn delete(&self, race_id: Uuid, category_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE race_id = $1 AND category_id = $2")
            .bind(race_id)
            .bind(category_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    pub async fn delete_all(&self, race_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM categories WHERE race_id = $1")
            .bind(race_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
