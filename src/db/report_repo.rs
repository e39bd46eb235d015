// src/db/report_repo.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::reports::{
        DashboardSummary, DateRange, ExpenseTotals, GroupedTotal, MaterialSummary, TaxTotals, VendorExpense,
    },
};

// Todas as consultas usam o mesmo filtro de período sobre `date_of_purchase`
const PERIOD: &str = "($1::date IS NULL OR v.date_of_purchase >= $1) AND ($2::date IS NULL OR v.date_of_purchase <= $2)";

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Gasto por fornecedor
    pub async fn vendor_expenses(&self, range: DateRange) -> Result<Vec<VendorExpense>, AppError> {
        let rows = sqlx::query_as::<_, VendorExpense>(&format!(
            r#"
            SELECT v.vendor_id, vd.name AS vendor_name,
                   COALESCE(SUM(v.final_amount), 0) AS total_spend,
                   COUNT(*) AS voucher_count
            FROM vouchers v
            JOIN vendors vd ON vd.id = v.vendor_id
            WHERE {PERIOD}
            GROUP BY v.vendor_id, vd.name
            ORDER BY total_spend DESC
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // 2. Quantidade e gasto por material (abre os itens do JSONB)
    pub async fn material_summary(&self, range: DateRange) -> Result<Vec<MaterialSummary>, AppError> {
        let rows = sqlx::query_as::<_, MaterialSummary>(&format!(
            r#"
            SELECT m.id AS material_id, m.name AS material_name, m.unit,
                   COALESCE(SUM((item->>'quantity')::numeric), 0) AS total_quantity,
                   COALESCE(SUM((item->>'quantity')::numeric * (item->>'pricePerUnit')::numeric), 0) AS total_spend
            FROM vouchers v
            CROSS JOIN LATERAL jsonb_array_elements(v.items) AS item
            JOIN materials m ON m.id = (item->>'materialId')::uuid
            WHERE {PERIOD}
            GROUP BY m.id, m.name, m.unit
            ORDER BY total_spend DESC
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // 3. Totais do período (zeros quando não há vouchers)
    pub async fn expenses(&self, range: DateRange) -> Result<ExpenseTotals, AppError> {
        let totals = sqlx::query_as::<_, ExpenseTotals>(&format!(
            r#"
            SELECT COALESCE(SUM(v.final_amount), 0) AS total_spend,
                   COALESCE(SUM(v.tax_amount), 0) AS total_tax,
                   COUNT(*) AS voucher_count
            FROM vouchers v
            WHERE {PERIOD}
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    // 4. Impostos e pagamentos
    pub async fn tax_totals(&self, range: DateRange) -> Result<TaxTotals, AppError> {
        let totals = sqlx::query_as::<_, TaxTotals>(&format!(
            r#"
            SELECT COALESCE(SUM(v.tax_amount), 0) AS total_tax,
                   COALESCE(SUM(v.final_amount), 0) AS total_payable
            FROM vouchers v
            WHERE {PERIOD}
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    pub async fn totals_by_payment_status(&self, range: DateRange) -> Result<Vec<GroupedTotal>, AppError> {
        self.grouped_totals("v.payment_status::text", range).await
    }

    pub async fn totals_by_payment_method(&self, range: DateRange) -> Result<Vec<GroupedTotal>, AppError> {
        self.grouped_totals("v.payment_method", range).await
    }

    // `column` é sempre uma das expressões fixas acima, nunca entrada do cliente
    async fn grouped_totals(&self, column: &str, range: DateRange) -> Result<Vec<GroupedTotal>, AppError> {
        let rows = sqlx::query_as::<_, GroupedTotal>(&format!(
            r#"
            SELECT {column} AS label, COALESCE(SUM(v.final_amount), 0) AS total, COUNT(*) AS count
            FROM vouchers v
            WHERE {PERIOD}
            GROUP BY 1
            ORDER BY total DESC
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // 5. Resumo do painel (snapshot consistente numa transação)
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, AppError> {
        let mut tx = self.pool.begin().await?;

        let expenses = sqlx::query_as::<_, ExpenseTotals>(
            r#"
            SELECT COALESCE(SUM(final_amount), 0) AS total_spend,
                   COALESCE(SUM(tax_amount), 0) AS total_tax,
                   COUNT(*) AS voucher_count
            FROM vouchers
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        let (outstanding_amount, outstanding_count): (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(final_amount), 0), COUNT(*)
            FROM vouchers
            WHERE payment_status IN ('Pending', 'Partially Paid')
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        let (vendor_count, active_vendor_count, material_count): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM vendors),
                   (SELECT COUNT(*) FROM vendors WHERE status = 'Active'),
                   (SELECT COUNT(*) FROM materials)
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            expenses,
            outstanding_amount,
            outstanding_count,
            vendor_count,
            active_vendor_count,
            material_count,
        })
    }
}
