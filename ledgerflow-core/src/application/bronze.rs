// ledgerflow-core/src/application/bronze.rs

use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::application::context::StageContext;
use crate::application::engine::execute_query;
use crate::application::report::{EntityOutcome, InputStatus, StageReport};
use crate::domain::compiler::SqlQuoter;
use crate::domain::error::DomainError;
use crate::domain::layer::{Artifact, Layer};
use crate::domain::project::OnMissing;
use crate::error::LedgerflowError;
use crate::infrastructure::config::LoadedCatalog;
use crate::ports::artifact_store::ArtifactStore;
use crate::ports::connector::Connector;
use crate::ports::source_reader::{SourceReader, StagedRelation};

#[derive(Default)]
struct Staged {
    projects: Vec<StagedRelation>,
    expenses: Vec<StagedRelation>,
    budgets: Vec<StagedRelation>,
}

/// Bronze: stages every catalog entity and persists the three raw unions.
///
/// Inputs of an entity are independent: a missing budget file does not drop
/// the entity's relational rows. Missing inputs follow `sources.on-missing`.
#[instrument(skip_all, fields(entities = catalog.catalog.len()))]
pub async fn run_bronze(
    ctx: &StageContext<'_>,
    catalog: &LoadedCatalog,
    connector: &dyn Connector,
    reader: &dyn SourceReader,
    store: &dyn ArtifactStore,
) -> Result<StageReport, LedgerflowError> {
    let start = Instant::now();
    let mut report = StageReport::new(Layer::Bronze);
    let on_missing = ctx.config.sources.on_missing;

    println!(
        "🥉 Bronze: assembling {} entities",
        catalog.catalog.entities().len()
    );

    let mut staged = Staged::default();

    for entity in catalog.catalog.entities() {
        // 1. Relational store (project + expenses)
        let db_path = catalog.resolve(&entity.database);
        match reader.stage_relational(&entity.code, &db_path).await {
            Ok(extract) => {
                println!(
                    "   ✅ {} database: {} projects, {} expenses",
                    entity.code, extract.projects.rows, extract.expenses.rows
                );
                report.entities.push(EntityOutcome {
                    entity: entity.code.to_string(),
                    input: "database".into(),
                    status: InputStatus::Loaded,
                    rows: extract.projects.rows + extract.expenses.rows,
                    detail: None,
                });
                staged.projects.push(extract.projects);
                staged.expenses.push(extract.expenses);
            }
            Err(e) if e.is_input_missing() => {
                handle_missing(on_missing, e, &entity.code.to_string(), "database", &mut report)?;
            }
            Err(e) => return Err(e),
        }

        // 2. Budget flat file
        let budget_path = catalog.resolve(&entity.budget);
        match reader.stage_budget(&entity.code, &budget_path).await {
            Ok(budget) => {
                println!("   ✅ {} budget: {} rows", entity.code, budget.rows);
                report.entities.push(EntityOutcome {
                    entity: entity.code.to_string(),
                    input: "budget".into(),
                    status: InputStatus::Loaded,
                    rows: budget.rows,
                    detail: None,
                });
                staged.budgets.push(budget);
            }
            Err(e) if e.is_input_missing() => {
                handle_missing(on_missing, e, &entity.code.to_string(), "budget", &mut report)?;
            }
            Err(e) => return Err(e),
        }
    }

    // 3. Union + persistance
    for (artifact, parts) in [
        (Artifact::bronze_projects(), &staged.projects),
        (Artifact::bronze_expenses(), &staged.expenses),
        (Artifact::bronze_budgets(), &staged.budgets),
    ] {
        if parts.is_empty() {
            return Err(DomainError::NoSources(artifact.qualified_name()).into());
        }
        let work = artifact.work_relation();
        execute_query(connector, &union_by_name(&work, parts)).await?;

        let info = store.write(&artifact, &work).await?;
        println!("   💾 {} ({} rows)", info.name, info.rows);
        report.artifacts.push(info);

        let drops: String = parts
            .iter()
            .map(|p| format!("DROP TABLE IF EXISTS {};", SqlQuoter::ident(&p.relation)))
            .collect();
        execute_query(connector, &drops).await?;
    }

    report.duration_ms = start.elapsed().as_millis();
    report.save(&ctx.target_dir())?;
    info!(duration_ms = report.duration_ms, "Bronze finished");
    Ok(report)
}

fn handle_missing(
    policy: OnMissing,
    error: LedgerflowError,
    entity: &str,
    input: &str,
    report: &mut StageReport,
) -> Result<(), LedgerflowError> {
    match policy {
        OnMissing::Abort => {
            eprintln!("   ❌ {}", error);
            Err(error)
        }
        OnMissing::Skip => {
            warn!(entity, input, "{}", error);
            println!("   ⚠️  {} {} skipped: {}", entity, input, error);
            report.warnings.push(error.to_string());
            report.entities.push(EntityOutcome {
                entity: entity.to_string(),
                input: input.to_string(),
                status: InputStatus::Missing,
                rows: 0,
                detail: Some(error.to_string()),
            });
            Ok(())
        }
    }
}

/// Pure concatenation; columns absent from an entity come out NULL.
fn union_by_name(target: &str, parts: &[StagedRelation]) -> String {
    let selects: Vec<String> = parts
        .iter()
        .map(|p| format!("SELECT * FROM {}", SqlQuoter::ident(&p.relation)))
        .collect();
    format!(
        "CREATE OR REPLACE TABLE {} AS {};",
        SqlQuoter::ident(target),
        selects.join(" UNION ALL BY NAME ")
    )
}
