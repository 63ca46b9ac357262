use sqlx::SqlitePool;

use crate::api::dto::CreateCardRequest;
use crate::domain::{Pipeline, PipelineError};
use crate::services::CardService;

const DEMO_LEADS: &[(&str, &str, &str)] = &[
    ("Northwind Bistro", "Northwind Hospitality", "new"),
    ("Harbor Dental", "Harbor Health Group", "contacted"),
    ("Lumen Fitness", "Lumen Studios", "qualified"),
];

const DEMO_OPPORTUNITIES: &[(&str, &str, &str, i64)] = &[
    ("Annual listing upgrade", "Harbor Health Group", "discovery", 120_000),
    ("Review widget rollout", "Lumen Studios", "proposal_sent", 48_000),
];

/// Inserts a handful of demo cards when both pipelines are empty.
pub async fn seed_demo_cards(pool: &SqlitePool) -> Result<(), PipelineError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pipeline_cards")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        tracing::debug!(existing, "Pipeline cards already present, skipping demo seed");
        return Ok(());
    }

    for (name, company, stage) in DEMO_LEADS {
        let mut req = CreateCardRequest::named(*name);
        req.company = Some(company.to_string());
        req.stage = Some(stage.to_string());
        CardService::create_card(pool, Pipeline::Leads, req).await?;
    }

    for (name, company, stage, value_cents) in DEMO_OPPORTUNITIES {
        let mut req = CreateCardRequest::named(*name);
        req.company = Some(company.to_string());
        req.stage = Some(stage.to_string());
        req.value_cents = Some(*value_cents);
        CardService::create_card(pool, Pipeline::Opportunities, req).await?;
    }

    tracing::info!(
        leads = DEMO_LEADS.len(),
        opportunities = DEMO_OPPORTUNITIES.len(),
        "Seeded demo pipeline cards"
    );
    Ok(())
}
