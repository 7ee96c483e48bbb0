//! Ledger repository
//!
//! Row types and SQL for the `properties` and `investments` tables. Every
//! function takes an executor so the adapter can run it on the pool or inside
//! a transaction.
//!
//! Writes that replace a document are guarded by `version`; they report
//! `false` instead of an error when the guard did not match.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use domain_investment::{Investment, InvestmentQuery};
use domain_property::Property;

use crate::error::DatabaseError;

/// A row of the `properties` table
#[derive(Debug, Clone, FromRow)]
pub struct PropertyRow {
    pub property_id: Uuid,
    pub property_type: String,
    pub status: String,
    pub is_active: bool,
    pub total_shares: i32,
    pub available_shares: i32,
    pub version: i64,
    pub document: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PropertyRow {
    pub fn from_domain(property: &Property) -> Result<Self, DatabaseError> {
        Ok(Self {
            property_id: *property.id().as_uuid(),
            property_type: property.property_type().as_str().to_string(),
            status: property.status().as_str().to_string(),
            is_active: property.is_active(),
            total_shares: to_i32(property.total_shares())?,
            available_shares: to_i32(property.available_shares())?,
            version: to_i64(property.version())?,
            document: serde_json::to_value(property)?,
            created_at: property.created_at(),
            updated_at: property.updated_at(),
        })
    }

    pub fn into_domain(self) -> Result<Property, DatabaseError> {
        let property: Property = serde_json::from_value(self.document)?;
        if to_i64(property.version())? != self.version {
            return Err(DatabaseError::SerializationError(format!(
                "property {} document version does not match its row",
                self.property_id
            )));
        }
        Ok(property)
    }
}

/// A row of the `investments` table
#[derive(Debug, Clone, FromRow)]
pub struct InvestmentRow {
    pub investment_id: Uuid,
    pub user_id: Uuid,
    pub property_id: Uuid,
    pub status: String,
    pub shares_invested: i32,
    pub version: i64,
    pub document: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvestmentRow {
    pub fn from_domain(investment: &Investment) -> Result<Self, DatabaseError> {
        Ok(Self {
            investment_id: *investment.id().as_uuid(),
            user_id: *investment.user_id().as_uuid(),
            property_id: *investment.property_id().as_uuid(),
            status: investment.status().as_str().to_string(),
            shares_invested: to_i32(investment.shares_invested())?,
            version: to_i64(investment.version())?,
            document: serde_json::to_value(investment)?,
            created_at: investment.created_at(),
            updated_at: investment.updated_at(),
        })
    }

    pub fn into_domain(self) -> Result<Investment, DatabaseError> {
        Ok(serde_json::from_value(self.document)?)
    }
}

fn to_i32(value: u32) -> Result<i32, DatabaseError> {
    i32::try_from(value)
        .map_err(|_| DatabaseError::SerializationError(format!("{} does not fit in INTEGER", value)))
}

fn to_i64(value: u64) -> Result<i64, DatabaseError> {
    i64::try_from(value)
        .map_err(|_| DatabaseError::SerializationError(format!("{} does not fit in BIGINT", value)))
}

// ============================================================================
// Properties
// ============================================================================

const PROPERTY_COLUMNS: &str = "property_id, property_type, status, is_active, total_shares, \
     available_shares, version, document, created_at, updated_at";

pub async fn insert_property<'e, E>(executor: E, row: &PropertyRow) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO properties (
            property_id, property_type, status, is_active, total_shares,
            available_shares, version, document, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(row.property_id)
    .bind(&row.property_type)
    .bind(&row.status)
    .bind(row.is_active)
    .bind(row.total_shares)
    .bind(row.available_shares)
    .bind(row.version)
    .bind(&row.document)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn fetch_property<'e, E>(executor: E, property_id: Uuid) -> Result<Option<PropertyRow>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PropertyRow>(&format!(
        "SELECT {} FROM properties WHERE property_id = $1",
        PROPERTY_COLUMNS
    ))
    .bind(property_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Loads a property and holds its row lock until the transaction ends
pub async fn lock_property<'e, E>(executor: E, property_id: Uuid) -> Result<Option<PropertyRow>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PropertyRow>(&format!(
        "SELECT {} FROM properties WHERE property_id = $1 FOR UPDATE",
        PROPERTY_COLUMNS
    ))
    .bind(property_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Replaces a property if its stored version equals `expected_version`
pub async fn update_property<'e, E>(
    executor: E,
    row: &PropertyRow,
    expected_version: i64,
) -> Result<bool, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE properties
        SET status = $2, is_active = $3, total_shares = $4, available_shares = $5,
            version = $6, document = $7, updated_at = $8
        WHERE property_id = $1 AND version = $9
        "#,
    )
    .bind(row.property_id)
    .bind(&row.status)
    .bind(row.is_active)
    .bind(row.total_shares)
    .bind(row.available_shares)
    .bind(row.version)
    .bind(&row.document)
    .bind(row.updated_at)
    .bind(expected_version)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Writes a property after a reservation of `shares`
///
/// Matches only while the stored row still has at least `shares` available,
/// so inventory never goes negative even if the caller's checks were stale.
pub async fn take_shares<'e, E>(executor: E, row: &PropertyRow, shares: i32) -> Result<bool, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE properties
        SET status = $2, available_shares = $3, version = $4, document = $5, updated_at = $6
        WHERE property_id = $1 AND available_shares >= $7 AND available_shares - $7 = $3
        "#,
    )
    .bind(row.property_id)
    .bind(&row.status)
    .bind(row.available_shares)
    .bind(row.version)
    .bind(&row.document)
    .bind(row.updated_at)
    .bind(shares)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

// ============================================================================
// Investments
// ============================================================================

const INVESTMENT_COLUMNS: &str = "investment_id, user_id, property_id, status, shares_invested, \
     version, document, created_at, updated_at";

pub async fn insert_investment<'e, E>(executor: E, row: &InvestmentRow) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO investments (
            investment_id, user_id, property_id, status, shares_invested,
            version, document, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(row.investment_id)
    .bind(row.user_id)
    .bind(row.property_id)
    .bind(&row.status)
    .bind(row.shares_invested)
    .bind(row.version)
    .bind(&row.document)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn fetch_investment<'e, E>(executor: E, investment_id: Uuid) -> Result<Option<InvestmentRow>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, InvestmentRow>(&format!(
        "SELECT {} FROM investments WHERE investment_id = $1",
        INVESTMENT_COLUMNS
    ))
    .bind(investment_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Lists investments matching `query`, oldest first
pub async fn list_investments<'e, E>(executor: E, query: &InvestmentQuery) -> Result<Vec<InvestmentRow>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let statuses: Vec<String> = query.statuses.iter().map(|s| s.as_str().to_string()).collect();
    let rows = sqlx::query_as::<_, InvestmentRow>(&format!(
        r#"
        SELECT {}
        FROM investments
        WHERE ($1::uuid IS NULL OR user_id = $1)
          AND ($2::uuid IS NULL OR property_id = $2)
          AND (cardinality($3::text[]) = 0 OR status = ANY($3))
        ORDER BY created_at, investment_id
        "#,
        INVESTMENT_COLUMNS
    ))
    .bind(query.user_id.map(|id| *id.as_uuid()))
    .bind(query.property_id.map(|id| *id.as_uuid()))
    .bind(statuses)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Replaces an investment if its stored version equals `expected_version`
pub async fn update_investment<'e, E>(
    executor: E,
    row: &InvestmentRow,
    expected_version: i64,
) -> Result<bool, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE investments
        SET status = $2, version = $3, document = $4, updated_at = $5
        WHERE investment_id = $1 AND version = $6
        "#,
    )
    .bind(row.investment_id)
    .bind(&row.status)
    .bind(row.version)
    .bind(&row.document)
    .bind(row.updated_at)
    .bind(expected_version)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Shares a user holds in a property across non-cancelled investments
pub async fn active_user_shares<'e, E>(executor: E, user_id: Uuid, property_id: Uuid) -> Result<u32, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(shares_invested), 0)::BIGINT
        FROM investments
        WHERE user_id = $1 AND property_id = $2 AND status <> 'cancelled'
        "#,
    )
    .bind(user_id)
    .bind(property_id)
    .fetch_one(executor)
    .await?;
    u32::try_from(total)
        .map_err(|_| DatabaseError::SerializationError(format!("share total {} out of range", total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_kernel::{Currency, Money, UserId};
    use domain_property::{InstallmentFrequency, NewProperty, PropertyType};
    use rust_decimal_macros::dec;

    fn property() -> Property {
        Property::register(
            NewProperty {
                property_type: PropertyType::Single,
                title: "Corniche Villa".to_string(),
                location: "Abu Dhabi".to_string(),
                bundle_items: Vec::new(),
                price: Money::from_units(1_000_000, Currency::AED),
                total_shares: 100,
                advancement_percent: dec!(20),
                number_of_installments: 10,
                installment_frequency: InstallmentFrequency::Quarterly,
                max_shares_per_user: Some(10),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_property_row_mirrors_document() {
        let property = property();
        let row = PropertyRow::from_domain(&property).unwrap();

        assert_eq!(row.property_type, "single");
        assert_eq!(row.status, "available");
        assert_eq!(row.available_shares, 100);
        assert_eq!(row.version, 1);
        assert_eq!(row.into_domain().unwrap(), property);
    }

    #[test]
    fn test_row_version_must_match_document() {
        let mut row = PropertyRow::from_domain(&property()).unwrap();
        row.version = 7;
        assert!(matches!(
            row.into_domain(),
            Err(DatabaseError::SerializationError(_))
        ));
    }

    #[test]
    fn test_investment_row_columns() {
        let property = property();
        let investment = Investment::open(UserId::new(), &property, 4, None, Utc::now()).unwrap();
        let row = InvestmentRow::from_domain(&investment).unwrap();

        assert_eq!(row.status, "pending");
        assert_eq!(row.shares_invested, 4);
        assert_eq!(row.property_id, *property.id().as_uuid());
        assert_eq!(row.into_domain().unwrap(), investment);
    }
}
