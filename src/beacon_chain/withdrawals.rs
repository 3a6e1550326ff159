use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::{performance::TimedExt, sources::WithdrawalLedger, units::GweiNewtype};

/// Withdrawals as indexed by the explorer. Withdrawals in orphaned blocks don't count, only those
/// in canonical blocks (status '1').
pub struct WithdrawalLedgerPostgres {
    db_pool: PgPool,
}

impl WithdrawalLedgerPostgres {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

fn parse_withdrawal_sum(sum: &str) -> Result<GweiNewtype> {
    sum.parse::<GweiNewtype>()
        .with_context(|| format!("withdrawal sum {sum} is not a gwei amount"))
}

#[async_trait]
impl WithdrawalLedger for WithdrawalLedgerPostgres {
    async fn total_amount_withdrawn(&self) -> Result<GweiNewtype> {
        let sum = sqlx::query_scalar::<_, String>(
            "
            SELECT
                COALESCE(SUM(w.amount), 0)::TEXT
            FROM
                blocks_withdrawals w
            INNER JOIN blocks b ON b.blockroot = w.block_root AND b.status = '1'
            ",
        )
        .fetch_one(&self.db_pool)
        .timed("get_total_amount_withdrawn")
        .await
        .context("failed to sum withdrawals")?;

        let total_withdrawn = parse_withdrawal_sum(&sum)?;
        debug!(%total_withdrawn, "summed withdrawals");

        Ok(total_withdrawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_withdrawal_sum_test() {
        assert_eq!(
            parse_withdrawal_sum("1000000000000000").unwrap(),
            GweiNewtype(1_000_000_000_000_000)
        );
    }

    #[test]
    fn parse_withdrawal_sum_empty_ledger_test() {
        assert_eq!(parse_withdrawal_sum("0").unwrap(), GweiNewtype(0));
    }

    #[test]
    fn parse_withdrawal_sum_rejects_fraction_test() {
        assert!(parse_withdrawal_sum("12.5").is_err());
    }
}
