//! Catalog service: materials, warehouses, vendors, and customers
//!
//! Thin organization-scoped CRUD that the order and stock workflows depend
//! on. Records are soft-deleted with a deletedBy stamp.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::{AuditActor, PageQuery, PaginationMeta};
use shared::{validate_name, Customer, Material, Vendor, Warehouse};

/// Catalog service
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Database row for a material
#[derive(Debug, FromRow)]
struct MaterialRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    unit: Option<String>,
    category: Option<String>,
    is_deleted: bool,
    created_by: Option<Json<AuditActor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MaterialRow> for Material {
    fn from(row: MaterialRow) -> Self {
        Material {
            id: row.id,
            org_id: row.org_id,
            name: row.name,
            unit: row.unit,
            category: row.category,
            is_deleted: row.is_deleted,
            created_by: row.created_by.map(|j| j.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a warehouse
#[derive(Debug, FromRow)]
struct WarehouseRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    location: Option<String>,
    is_deleted: bool,
    created_by: Option<Json<AuditActor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Warehouse {
            id: row.id,
            org_id: row.org_id,
            name: row.name,
            location: row.location,
            is_deleted: row.is_deleted,
            created_by: row.created_by.map(|j| j.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a vendor or customer (same shape)
#[derive(Debug, FromRow)]
struct PartyRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    is_deleted: bool,
    created_by: Option<Json<AuditActor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PartyRow> for Vendor {
    fn from(row: PartyRow) -> Self {
        Vendor {
            id: row.id,
            org_id: row.org_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            is_deleted: row.is_deleted,
            created_by: row.created_by.map(|j| j.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<PartyRow> for Customer {
    fn from(row: PartyRow) -> Self {
        Customer {
            id: row.id,
            org_id: row.org_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            is_deleted: row.is_deleted,
            created_by: row.created_by.map(|j| j.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a material
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialInput {
    pub name: String,
    pub unit: Option<String>,
    pub category: Option<String>,
}

/// Input for creating a warehouse
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehouseInput {
    pub name: String,
    pub location: Option<String>,
}

/// Input for creating a vendor or customer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartyInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Materials
    // ------------------------------------------------------------------

    /// Create a material; names are unique per organization
    pub async fn create_material(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreateMaterialInput,
    ) -> AppResult<Material> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;
        self.ensure_unique_name(org_id, "materials", input.name.trim(), "material name")
            .await?;

        let row = sqlx::query_as::<_, MaterialRow>(
            r#"
            INSERT INTO materials (org_id, name, unit, category, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, org_id, name, unit, category, is_deleted, created_by, created_at, updated_at
            "#,
        )
        .bind(org_id)
        .bind(input.name.trim())
        .bind(input.unit.as_deref())
        .bind(input.category.as_deref())
        .bind(Json(actor))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// List materials
    pub async fn list_materials(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Material>, PaginationMeta)> {
        let total = self.count_rows(org_id, "materials").await?;

        let rows = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT id, org_id, name, unit, category, is_deleted, created_by, created_at, updated_at
            FROM materials
            WHERE org_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(org_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let materials = rows.into_iter().map(Material::from).collect();
        Ok((materials, PaginationMeta::new(total, page)))
    }

    /// Soft-delete a material
    pub async fn remove_material(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        material_id: Uuid,
    ) -> AppResult<()> {
        self.soft_delete(org_id, actor, "materials", material_id, "Material")
            .await
    }

    // ------------------------------------------------------------------
    // Warehouses
    // ------------------------------------------------------------------

    /// Create a warehouse; names are unique per organization
    pub async fn create_warehouse(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreateWarehouseInput,
    ) -> AppResult<Warehouse> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;
        self.ensure_unique_name(org_id, "warehouses", input.name.trim(), "warehouse name")
            .await?;

        let row = sqlx::query_as::<_, WarehouseRow>(
            r#"
            INSERT INTO warehouses (org_id, name, location, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, org_id, name, location, is_deleted, created_by, created_at, updated_at
            "#,
        )
        .bind(org_id)
        .bind(input.name.trim())
        .bind(input.location.as_deref())
        .bind(Json(actor))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// List warehouses
    pub async fn list_warehouses(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Warehouse>, PaginationMeta)> {
        let total = self.count_rows(org_id, "warehouses").await?;

        let rows = sqlx::query_as::<_, WarehouseRow>(
            r#"
            SELECT id, org_id, name, location, is_deleted, created_by, created_at, updated_at
            FROM warehouses
            WHERE org_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(org_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let warehouses = rows.into_iter().map(Warehouse::from).collect();
        Ok((warehouses, PaginationMeta::new(total, page)))
    }

    /// Soft-delete a warehouse
    pub async fn remove_warehouse(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        warehouse_id: Uuid,
    ) -> AppResult<()> {
        self.soft_delete(org_id, actor, "warehouses", warehouse_id, "Warehouse")
            .await
    }

    // ------------------------------------------------------------------
    // Vendors
    // ------------------------------------------------------------------

    /// Create a vendor
    pub async fn create_vendor(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreatePartyInput,
    ) -> AppResult<Vendor> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;

        let row = self.insert_party(org_id, actor, "vendors", &input).await?;
        Ok(row.into())
    }

    /// List vendors
    pub async fn list_vendors(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Vendor>, PaginationMeta)> {
        let total = self.count_rows(org_id, "vendors").await?;
        let rows = self.list_parties(org_id, "vendors", page).await?;
        let vendors = rows.into_iter().map(Vendor::from).collect();
        Ok((vendors, PaginationMeta::new(total, page)))
    }

    /// Soft-delete a vendor
    pub async fn remove_vendor(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        vendor_id: Uuid,
    ) -> AppResult<()> {
        self.soft_delete(org_id, actor, "vendors", vendor_id, "Vendor")
            .await
    }

    // ------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------

    /// Create a customer
    pub async fn create_customer(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        input: CreatePartyInput,
    ) -> AppResult<Customer> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;

        let row = self.insert_party(org_id, actor, "customers", &input).await?;
        Ok(row.into())
    }

    /// List customers
    pub async fn list_customers(
        &self,
        org_id: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Customer>, PaginationMeta)> {
        let total = self.count_rows(org_id, "customers").await?;
        let rows = self.list_parties(org_id, "customers", page).await?;
        let customers = rows.into_iter().map(Customer::from).collect();
        Ok((customers, PaginationMeta::new(total, page)))
    }

    /// Soft-delete a customer
    pub async fn remove_customer(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        customer_id: Uuid,
    ) -> AppResult<()> {
        self.soft_delete(org_id, actor, "customers", customer_id, "Customer")
            .await
    }

    // ------------------------------------------------------------------
    // Shared helpers (table names are compile-time constants, never input)
    // ------------------------------------------------------------------

    async fn count_rows(&self, org_id: Uuid, table: &'static str) -> AppResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {table} WHERE org_id = $1 AND is_deleted = FALSE"
        ))
        .bind(org_id)
        .fetch_one(&self.db)
        .await?;
        Ok(total)
    }

    async fn ensure_unique_name(
        &self,
        org_id: Uuid,
        table: &'static str,
        name: &str,
        what: &str,
    ) -> AppResult<()> {
        let duplicate = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {table} WHERE org_id = $1 AND name = $2 AND is_deleted = FALSE)"
        ))
        .bind(org_id)
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateEntry(what.to_string()));
        }
        Ok(())
    }

    async fn insert_party(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        table: &'static str,
        input: &CreatePartyInput,
    ) -> AppResult<PartyRow> {
        let row = sqlx::query_as::<_, PartyRow>(&format!(
            r#"
            INSERT INTO {table} (org_id, name, email, phone, address, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, org_id, name, email, phone, address, is_deleted, created_by,
                      created_at, updated_at
            "#
        ))
        .bind(org_id)
        .bind(input.name.trim())
        .bind(input.email.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.address.as_deref())
        .bind(Json(actor))
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    async fn list_parties(
        &self,
        org_id: Uuid,
        table: &'static str,
        page: &PageQuery,
    ) -> AppResult<Vec<PartyRow>> {
        let rows = sqlx::query_as::<_, PartyRow>(&format!(
            r#"
            SELECT id, org_id, name, email, phone, address, is_deleted, created_by,
                   created_at, updated_at
            FROM {table}
            WHERE org_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(org_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn soft_delete(
        &self,
        org_id: Uuid,
        actor: &AuditActor,
        table: &'static str,
        id: Uuid,
        what: &str,
    ) -> AppResult<()> {
        let deleted_by = actor.clone().stamped(Utc::now());
        let result = sqlx::query(&format!(
            r#"
            UPDATE {table}
            SET is_deleted = TRUE, deleted_by = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND is_deleted = FALSE
            "#
        ))
        .bind(id)
        .bind(org_id)
        .bind(Json(&deleted_by))
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(what.to_string()));
        }

        Ok(())
    }
}
