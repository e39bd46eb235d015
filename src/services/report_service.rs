// src/services/report_service.rs

use crate::{
    common::error::AppError,
    db::ReportRepository,
    models::reports::{
        DashboardSummary, DateRange, ExpenseTotals, MaterialSummary, TaxPaymentReport, VendorExpense,
    },
};

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository) -> Self {
        Self { repo }
    }

    pub async fn vendor_expenses(&self, range: DateRange) -> Result<Vec<VendorExpense>, AppError> {
        self.repo.vendor_expenses(range).await
    }

    pub async fn material_summary(&self, range: DateRange) -> Result<Vec<MaterialSummary>, AppError> {
        self.repo.material_summary(range).await
    }

    pub async fn expenses(&self, range: DateRange) -> Result<ExpenseTotals, AppError> {
        self.repo.expenses(range).await
    }

    /// Impostos e agrupamentos por status e forma de pagamento no mesmo período.
    pub async fn tax_payments(&self, range: DateRange) -> Result<TaxPaymentReport, AppError> {
        let (tax, payment_status, payment_method) = tokio::try_join!(
            self.repo.tax_totals(range),
            self.repo.totals_by_payment_status(range),
            self.repo.totals_by_payment_method(range),
        )?;

        Ok(TaxPaymentReport { tax, payment_status, payment_method })
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary, AppError> {
        self.repo.dashboard_summary().await
    }
}
