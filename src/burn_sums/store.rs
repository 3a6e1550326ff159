use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::units::WeiNewtype;

pub struct BurnSumStore {
    db_pool: PgPool,
}

impl BurnSumStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Sum of base fees burned over every stored block.
    pub async fn burn_sum_all_blocks(&self) -> Result<WeiNewtype> {
        let burn_sum = sqlx::query_scalar::<_, String>(
            r#"
            SELECT
                COALESCE(SUM(base_fee_per_gas::NUMERIC(78) * gas_used::NUMERIC(78)), 0)::TEXT
            FROM
                blocks_next
            "#,
        )
        .fetch_one(&self.db_pool)
        .await
        .context("failed to sum burned base fees")?;

        parse_burn_sum(&burn_sum)
    }
}

// NUMERIC(78) sums come back without a fractional part, anything else is a corrupt row.
fn parse_burn_sum(burn_sum: &str) -> Result<WeiNewtype> {
    burn_sum
        .parse::<WeiNewtype>()
        .with_context(|| format!("burn sum {burn_sum} is not a wei amount"))
}
