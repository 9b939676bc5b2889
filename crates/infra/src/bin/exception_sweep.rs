//! Run the sale exception sweep once against a JSON state dump.
//!
//! `FORGEERP_STATE` names the dump (read, then written back), `FORGEERP_COMPANY`
//! the company to sweep and `FORGEERP_TODAY` (optional, `YYYY-MM-DD`) the run
//! date. The margin comes from the stored sale configuration unless
//! `FORGEERP_SALE_EXCEPTION_MARGIN_DAYS` overrides it.

use anyhow::Context;
use chrono::{NaiveDate, Utc};

use forgeerp_core::CompanyId;
use forgeerp_infra::InMemoryErp;
use forgeerp_revoke::{ExceptionSweep, SweepConfig};

fn main() -> anyhow::Result<()> {
    forgeerp_observability::init();

    let path = std::env::var("FORGEERP_STATE").context("FORGEERP_STATE not set")?;
    let company: CompanyId = std::env::var("FORGEERP_COMPANY")
        .context("FORGEERP_COMPANY not set")?
        .parse()
        .context("FORGEERP_COMPANY is not a company id")?;
    let today = match std::env::var("FORGEERP_TODAY") {
        Ok(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("FORGEERP_TODAY: invalid date {raw:?}"))?,
        Err(_) => Utc::now().date_naive(),
    };

    let erp = InMemoryErp::load_json(&path)?;
    let config = SweepConfig::new(company, &erp.sale_configuration()).with_env_override()?;
    let report = ExceptionSweep::new(&erp, config).run(today)?;
    erp.save_json(&path)?;

    for (sale, step, error) in &report.skipped {
        tracing::warn!(%sale, step = step.as_str(), %error, "sale left in exception");
    }
    tracing::info!(
        fixed = report.fixed.len(),
        skipped = report.skipped.len(),
        "state written to {path}"
    );
    Ok(())
}
