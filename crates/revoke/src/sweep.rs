//! Periodic fix of sales stuck in exception.
//!
//! Sales that stay in processing with a shipment or invoice exception for
//! longer than the configured margin are revoked in the background: their
//! unstarted shipments and invoices are cancelled and the cancelled records
//! reconciled as ignored. Every sale is attempted independently; failures
//! are logged and the sale is picked up again on the next run if it still
//! qualifies.

use chrono::{Days, NaiveDate};
use tracing::{info, warn};

use forgeerp_core::{CompanyId, DomainError, DomainResult};
use forgeerp_sales::{SaleConfiguration, SaleId, SaleOrder};

use crate::guard::{validate_invoices, validate_moves};
use crate::ports::{Platform, SaleExceptionSource};
use crate::revoke::Revoker;

/// Environment variable overriding the stored exception margin.
pub const MARGIN_ENV: &str = "FORGEERP_SALE_EXCEPTION_MARGIN_DAYS";

/// Sweep configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    pub company: CompanyId,
    pub margin_days: u32,
}

impl SweepConfig {
    /// Configuration for `company` using the stored sale configuration.
    pub fn new(company: CompanyId, stored: &SaleConfiguration) -> Self {
        Self {
            company,
            margin_days: stored.margin_days(),
        }
    }

    pub fn with_margin_days(mut self, days: u32) -> Self {
        self.margin_days = days;
        self
    }

    /// Apply the [`MARGIN_ENV`] override, if set.
    pub fn with_env_override(self) -> DomainResult<Self> {
        match std::env::var(MARGIN_ENV) {
            Ok(raw) => self.with_margin_override(&raw),
            Err(_) => Ok(self),
        }
    }

    fn with_margin_override(self, raw: &str) -> DomainResult<Self> {
        let days = raw.trim().parse::<u32>().map_err(|e| {
            DomainError::validation(format!("{MARGIN_ENV}: invalid value {raw:?}: {e}"))
        })?;
        Ok(self.with_margin_days(days))
    }

    /// Latest sale date a sale may have to be selected on `today`.
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.margin_days)))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Step at which a sale was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStep {
    Process,
    Shipment,
    Invoice,
}

impl SweepStep {
    pub fn as_str(self) -> &'static str {
        match self {
            SweepStep::Process => "process",
            SweepStep::Shipment => "shipment",
            SweepStep::Invoice => "invoice",
        }
    }
}

/// Result of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub selected: Vec<SaleId>,
    pub fixed: Vec<SaleId>,
    pub skipped: Vec<(SaleId, SweepStep, String)>,
}

/// Background exception sweep over sales.
pub struct ExceptionSweep<'p, P> {
    platform: &'p P,
    config: SweepConfig,
}

impl<'p, P> ExceptionSweep<'p, P>
where
    P: Platform<SaleOrder> + SaleExceptionSource,
{
    pub fn new(platform: &'p P, config: SweepConfig) -> Self {
        Self { platform, config }
    }

    /// Run one sweep. Only the selection itself can fail; per-sale failures
    /// are reported in [`SweepReport::skipped`].
    pub fn run(&self, today: NaiveDate) -> DomainResult<SweepReport> {
        let cutoff = self.config.cutoff(today);
        let selected = self
            .platform
            .find_exception_sales(self.config.company, cutoff)?;

        let mut report = SweepReport {
            selected: selected.clone(),
            ..SweepReport::default()
        };
        for id in selected {
            match self.handle_sale_exception(id) {
                Ok(()) => report.fixed.push(id),
                Err((step, error)) => report.skipped.push((id, step, error)),
            }
        }

        info!(
            company = %self.config.company,
            %cutoff,
            selected = report.selected.len(),
            fixed = report.fixed.len(),
            skipped = report.skipped.len(),
            "sale exception sweep finished"
        );
        Ok(report)
    }

    fn handle_sale_exception(&self, id: SaleId) -> Result<(), (SweepStep, String)> {
        let revoker = Revoker::new(self.platform);

        if let Err(e) = self.platform.atomically(|| self.platform.process(id)) {
            warn!(sale = %id, error = %e, "Skipped process");
            return Err((SweepStep::Process, e.to_string()));
        }

        match self.platform.load(id) {
            Ok(sale) => {
                if let Err(e) = validate_moves(self.platform, &sale) {
                    warn!(sale = %id, error = %e, "moves validation failed");
                }
                if let Err(e) = validate_invoices(self.platform, &sale) {
                    warn!(sale = %id, error = %e, "invoices validation failed");
                }
            }
            Err(e) => warn!(sale = %id, error = %e, "sale could not be validated"),
        }

        if let Err(e) = self
            .platform
            .atomically(|| revoker.handle_shipments::<SaleOrder>(id))
        {
            warn!(sale = %id, error = %e, "Skipped shipment");
            return Err((SweepStep::Shipment, e.to_string()));
        }

        if let Err(e) = self
            .platform
            .atomically(|| revoker.handle_invoices::<SaleOrder>(id))
        {
            warn!(sale = %id, error = %e, "Skipped invoice");
            return Err((SweepStep::Invoice, e.to_string()));
        }
        Ok(())
    }
}
