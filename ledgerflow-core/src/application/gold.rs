// ledgerflow-core/src/application/gold.rs

use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::application::context::StageContext;
use crate::application::engine::{execute_query, fetch_strings};
use crate::application::rates::RateResolver;
use crate::application::report::{CurrencyOutcome, GoldAudit, StageReport};
use crate::domain::calendar::MonthHorizon;
use crate::domain::compiler::SqlQuoter;
use crate::domain::currency::{RateResolution, RateTable};
use crate::domain::layer::{Artifact, Layer};
use crate::domain::measure::{MeasureStatus, UnresolvedPolicy};
use crate::error::LedgerflowError;
use crate::ports::artifact_store::ArtifactStore;
use crate::ports::connector::{CellValue, Connector};
use crate::ports::rate_provider::RateProvider;

/// Relation names and measure columns the fact is assembled from.
#[derive(Debug, Clone)]
pub struct FactInputs<'a> {
    pub expenses: &'a str,
    pub budgets: &'a str,
    pub rates: &'a str,
    pub dim_project: &'a str,
    pub currency_column: &'a str,
    pub amount_column: &'a str,
    pub budget_column: &'a str,
    pub project_attributes: &'a [String],
    pub policy: UnresolvedPolicy,
}

/// Gold: rates, project dimension, fact and calendar, persisted as four artifacts.
#[instrument(skip_all, fields(provider = provider.name()))]
pub async fn run_gold(
    ctx: &StageContext<'_>,
    connector: &dyn Connector,
    store: &dyn ArtifactStore,
    provider: &dyn RateProvider,
) -> Result<StageReport, LedgerflowError> {
    let start = Instant::now();
    let config = ctx.config;
    let mut report = StageReport::new(Layer::Gold);
    println!("🥇 Gold: modeling fact and dimensions");

    // 1. Lecture silver
    let expenses = store.read(&Artifact::silver_expenses()).await?;
    let budgets = store.read(&Artifact::silver_budgets()).await?;
    let projects = store.read(&Artifact::silver_projects()).await?;

    // 2. Taux de change
    let observed = fetch_strings(
        connector,
        &format!(
            "SELECT DISTINCT {} FROM {} WHERE {} IS NOT NULL ORDER BY 1",
            SqlQuoter::ident(&config.columns.currency),
            SqlQuoter::ident(&expenses),
            SqlQuoter::ident(&config.columns.currency)
        ),
    )
    .await?;
    println!("   🔎 {} distinct currencies", observed.len());
    let table = RateResolver::new(provider, &config.fx)
        .resolve(&observed, &config.reporting_currency)
        .await;
    let rates = Artifact::gold_fx_rates().work_relation();
    load_rate_table(connector, &rates, &table).await?;
    report.currencies = CurrencyOutcome::from_table(&table);

    // 3. Dimension projet
    let dim_project = Artifact::gold_dim_project().work_relation();
    let conflicts = build_dim_project(connector, &projects, &dim_project).await?;
    if conflicts > 0 {
        report.warnings.push(format!(
            "{} entity code(s) have conflicting project rows; one row kept per entity",
            conflicts
        ));
    }
    let attributes = present_attributes(
        connector,
        &dim_project,
        &config.dimensions.project_attributes,
        &mut report,
    )
    .await?;

    // 4. Fait
    let fact = Artifact::gold_fact().work_relation();
    let inputs = FactInputs {
        expenses: &expenses,
        budgets: &budgets,
        rates: &rates,
        dim_project: &dim_project,
        currency_column: &config.columns.currency,
        amount_column: &config.columns.amount_local,
        budget_column: &config.columns.budget_amount,
        project_attributes: &attributes,
        policy: config.fx.unresolved_policy,
    };
    execute_query(connector, &assemble_fact(&fact, &inputs)).await?;

    // 5. Calendrier
    let dim_date = Artifact::gold_dim_date().work_relation();
    build_dim_date(connector, &dim_date, &config.calendar).await?;

    // 6. Audit + persistance
    let mut audit = audit_fact(connector, &fact, &dim_project, &config.calendar).await?;
    audit.dim_project_conflicts = conflicts;
    audit.unresolved_currencies = table.unresolved().map(|(c, _)| c.clone()).collect();
    report_audit(&audit, config.fx.unresolved_policy, &mut report);

    for artifact in [
        Artifact::gold_fact(),
        Artifact::gold_dim_date(),
        Artifact::gold_dim_project(),
        Artifact::gold_fx_rates(),
    ] {
        let info = store.write(&artifact, &artifact.work_relation()).await?;
        println!("   💾 {} ({} rows)", info.name, info.rows);
        report.artifacts.push(info);
    }

    report.audit = Some(audit);
    report.duration_ms = start.elapsed().as_millis();
    report.save(&ctx.target_dir())?;
    info!(duration_ms = report.duration_ms, "Gold finished");
    Ok(report)
}

/// Persists the rate table as `(currency, multiplier, status, source, detail)`.
pub async fn load_rate_table(
    connector: &dyn Connector,
    relation: &str,
    table: &RateTable,
) -> Result<(), LedgerflowError> {
    execute_query(
        connector,
        &format!(
            "CREATE OR REPLACE TABLE {} (currency VARCHAR, multiplier DOUBLE, status VARCHAR, source VARCHAR, detail VARCHAR);",
            SqlQuoter::ident(relation)
        ),
    )
    .await?;

    let rows: Vec<Vec<CellValue>> = table
        .iter()
        .map(|(code, resolution)| {
            let (source, detail) = match resolution {
                RateResolution::Resolved { source, .. } => {
                    (CellValue::Text(source.as_str().to_string()), CellValue::Null)
                }
                RateResolution::Unresolved { reason } => {
                    (CellValue::Null, CellValue::Text(reason.to_string()))
                }
            };
            vec![
                CellValue::Text(code.clone()),
                resolution.multiplier().into(),
                CellValue::Text(resolution.status_label().to_string()),
                source,
                detail,
            ]
        })
        .collect();
    connector.load_rows(relation, &rows).await?;
    Ok(())
}

/// One row per entity code, picked deterministically. Returns how many entity
/// codes had more than one distinct project row.
pub async fn build_dim_project(
    connector: &dyn Connector,
    projects: &str,
    target: &str,
) -> Result<u64, LedgerflowError> {
    let columns: Vec<String> = connector
        .fetch_columns(projects)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let order: Vec<String> = columns
        .iter()
        .filter(|c| c.as_str() != "entity_code")
        .map(|c| format!("{} NULLS LAST", SqlQuoter::ident(c)))
        .collect();
    let order = if order.is_empty() {
        "entity_code".to_string()
    } else {
        order.join(", ")
    };

    let conflicts = connector
        .query_scalar(&format!(
            "SELECT COUNT(*) FROM (SELECT entity_code FROM (SELECT DISTINCT * FROM {src}) \
             GROUP BY entity_code HAVING COUNT(*) > 1)",
            src = SqlQuoter::ident(projects)
        ))
        .await?;
    if conflicts > 0 {
        warn!(conflicts, "Entity codes with conflicting project rows");
    }

    execute_query(
        connector,
        &format!(
            "CREATE OR REPLACE TABLE {target} AS \
             SELECT * FROM {src} WHERE entity_code IS NOT NULL \
             QUALIFY row_number() OVER (PARTITION BY entity_code ORDER BY {order}) = 1 \
             ORDER BY entity_code;",
            target = SqlQuoter::ident(target),
            src = SqlQuoter::ident(projects),
            order = order
        ),
    )
    .await?;
    Ok(conflicts)
}

/// Configured attributes that exist on the project dimension. Missing ones are
/// reported and left out of the fact.
async fn present_attributes(
    connector: &dyn Connector,
    dim_project: &str,
    configured: &[String],
    report: &mut StageReport,
) -> Result<Vec<String>, LedgerflowError> {
    let available: Vec<String> = connector
        .fetch_columns(dim_project)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    let mut kept = Vec::with_capacity(configured.len());
    for attribute in configured {
        if available.contains(attribute) {
            kept.push(attribute.clone());
        } else {
            warn!(attribute, "Project attribute not found in silver_projects");
            report
                .warnings
                .push(format!("project attribute '{}' not found", attribute));
        }
    }
    Ok(kept)
}

/// Builds the fact: expenses converted and budgets summed per
/// (date, entity_code, department, category), outer-joined, then enriched
/// with the project attributes. One row per distinct key.
///
/// An expense row counts as converted only with both a rate and an amount.
/// Rows missing either are counted on the fact row and drive its status.
pub fn assemble_fact(target: &str, inputs: &FactInputs<'_>) -> String {
    let key = ["date", "entity_code", "department", "category"];
    let key_list = SqlQuoter::ident_list(&key);

    let join_on = key
        .iter()
        .map(|k| {
            format!(
                "b.{k} IS NOT DISTINCT FROM x.{k}",
                k = SqlQuoter::ident(k)
            )
        })
        .collect::<Vec<_>>()
        .join(" AND ");
    let coalesced = key
        .iter()
        .map(|k| {
            format!(
                "COALESCE(b.{k}, x.{k}) AS {k}",
                k = SqlQuoter::ident(k)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let unresolved_status = inputs.policy.status().as_str();
    let invalid_status = inputs.policy.invalid_amount_status().as_str();
    let expense_measure = match inputs.policy {
        UnresolvedPolicy::Null => "NULL".to_string(),
        UnresolvedPolicy::Exclude => "COALESCE(j.converted, 0.0)".to_string(),
    };
    let attributes: String = inputs
        .project_attributes
        .iter()
        .map(|a| format!(", p.{}", SqlQuoter::ident(a)))
        .collect();

    format!(
        "CREATE OR REPLACE TABLE {target} AS
WITH expense_keys AS (
    SELECT {exp_key},
           SUM(CASE WHEN r.multiplier IS NOT NULL THEN CAST(e.{amount} AS DOUBLE) * r.multiplier END) AS converted,
           COUNT(*) FILTER (WHERE r.multiplier IS NULL) AS unresolved_rows,
           COUNT(*) FILTER (WHERE r.multiplier IS NOT NULL AND e.{amount} IS NULL) AS invalid_rows,
           TRUE AS has_expense
    FROM {expenses} e
    LEFT JOIN {rates} r ON r.currency = e.{currency} AND r.status = 'resolved'
    GROUP BY {exp_key}
),
budget_keys AS (
    SELECT {key_list},
           SUM(CAST({budget} AS DOUBLE)) AS budget,
           TRUE AS has_budget
    FROM {budgets}
    GROUP BY {key_list}
),
joined AS (
    SELECT {coalesced},
           b.budget, x.converted,
           COALESCE(x.unresolved_rows, 0) AS unresolved_rows,
           COALESCE(x.invalid_rows, 0) AS invalid_rows,
           COALESCE(b.has_budget, FALSE) AS has_budget,
           COALESCE(x.has_expense, FALSE) AS has_expense
    FROM budget_keys b
    FULL OUTER JOIN expense_keys x ON {join_on}
)
SELECT j.\"date\", j.\"entity_code\", j.\"department\", j.\"category\",
       CASE WHEN j.has_budget THEN j.budget ELSE 0.0 END AS budget_reporting,
       CASE WHEN NOT j.has_expense THEN 0.0
            WHEN j.unresolved_rows > 0 OR j.invalid_rows > 0 THEN {expense_measure}
            ELSE j.converted END AS expense_reporting,
       CASE WHEN j.has_budget THEN '{present}' ELSE '{absent}' END AS budget_status,
       CASE WHEN NOT j.has_expense THEN '{absent}'
            WHEN j.unresolved_rows > 0 THEN '{unresolved_status}'
            WHEN j.invalid_rows > 0 THEN '{invalid_status}'
            ELSE '{present}' END AS expense_status,
       CAST(j.unresolved_rows AS BIGINT) AS unresolved_expense_rows,
       CAST(j.invalid_rows AS BIGINT) AS invalid_amount_rows{attributes}
FROM joined j
LEFT JOIN {dim_project} p ON p.\"entity_code\" = j.\"entity_code\"
ORDER BY j.\"date\", j.\"entity_code\", j.\"department\" NULLS LAST, j.\"category\" NULLS LAST;",
        target = SqlQuoter::ident(target),
        exp_key = key
            .iter()
            .map(|k| format!("e.{}", SqlQuoter::ident(k)))
            .collect::<Vec<_>>()
            .join(", "),
        amount = SqlQuoter::ident(inputs.amount_column),
        currency = SqlQuoter::ident(inputs.currency_column),
        budget = SqlQuoter::ident(inputs.budget_column),
        expenses = SqlQuoter::ident(inputs.expenses),
        budgets = SqlQuoter::ident(inputs.budgets),
        rates = SqlQuoter::ident(inputs.rates),
        dim_project = SqlQuoter::ident(inputs.dim_project),
        key_list = key_list,
        coalesced = coalesced,
        join_on = join_on,
        expense_measure = expense_measure,
        present = MeasureStatus::Present.as_str(),
        absent = MeasureStatus::Absent.as_str(),
        unresolved_status = unresolved_status,
        invalid_status = invalid_status,
        attributes = attributes,
    )
}

/// Calendar dimension over the configured horizon, independent of the fact.
pub async fn build_dim_date(
    connector: &dyn Connector,
    target: &str,
    horizon: &MonthHorizon,
) -> Result<u64, LedgerflowError> {
    execute_query(
        connector,
        &format!(
            "CREATE OR REPLACE TABLE {} (\"date\" DATE, month_id VARCHAR, \"year\" INTEGER, \"month\" INTEGER, month_name VARCHAR);",
            SqlQuoter::ident(target)
        ),
    )
    .await?;

    let rows: Vec<Vec<CellValue>> = horizon
        .rows()
        .into_iter()
        .map(|row| {
            vec![
                CellValue::Date(row.date),
                CellValue::Text(row.month_id),
                CellValue::Integer(i64::from(row.year)),
                CellValue::Integer(i64::from(row.month)),
                CellValue::Text(row.month_name),
            ]
        })
        .collect();
    connector.load_rows(target, &rows).await
}

async fn audit_fact(
    connector: &dyn Connector,
    fact: &str,
    dim_project: &str,
    horizon: &MonthHorizon,
) -> Result<GoldAudit, LedgerflowError> {
    let fact = SqlQuoter::ident(fact);

    Ok(GoldAudit {
        fact_rows: count_where(connector, &fact, "TRUE").await?,
        unresolved_currencies: Vec::new(),
        unresolved_expense_rows: connector
            .query_scalar(&format!(
                "SELECT CAST(SUM(unresolved_expense_rows) AS BIGINT) FROM {}",
                fact
            ))
            .await?,
        invalid_amount_rows: connector
            .query_scalar(&format!(
                "SELECT CAST(SUM(invalid_amount_rows) AS BIGINT) FROM {}",
                fact
            ))
            .await?,
        null_expense_rows: count_where(
            connector,
            &fact,
            &format!(
                "expense_status IN ('{}', '{}')",
                MeasureStatus::Unresolved.as_str(),
                MeasureStatus::Invalid.as_str()
            ),
        )
        .await?,
        excluded_expense_rows: count_where(
            connector,
            &fact,
            &format!("expense_status = '{}'", MeasureStatus::Excluded.as_str()),
        )
        .await?,
        orphan_entity_rows: count_where(
            connector,
            &fact,
            &format!(
                "entity_code NOT IN (SELECT entity_code FROM {})",
                SqlQuoter::ident(dim_project)
            ),
        )
        .await?,
        rows_outside_calendar: count_where(
            connector,
            &fact,
            &format!(
                "\"date\" NOT BETWEEN DATE '{}' AND DATE '{}'",
                horizon.start.first_day(),
                horizon.end.first_day()
            ),
        )
        .await?,
        dim_project_conflicts: 0,
    })
}

async fn count_where(
    connector: &dyn Connector,
    relation: &str,
    predicate: &str,
) -> Result<u64, LedgerflowError> {
    connector
        .query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE {}", relation, predicate))
        .await
}

fn report_audit(audit: &GoldAudit, policy: UnresolvedPolicy, report: &mut StageReport) {
    println!("   📊 {} fact rows", audit.fact_rows);
    if audit.unresolved_expense_rows > 0 {
        let msg = match policy {
            UnresolvedPolicy::Null => format!(
                "{} expense row(s) in unresolved currencies {:?}: {} fact row(s) have a NULL expense_reporting",
                audit.unresolved_expense_rows, audit.unresolved_currencies, audit.null_expense_rows
            ),
            UnresolvedPolicy::Exclude => format!(
                "{} expense row(s) in unresolved currencies {:?} excluded from {} fact row(s)",
                audit.unresolved_expense_rows,
                audit.unresolved_currencies,
                audit.excluded_expense_rows
            ),
        };
        warn!("{}", msg);
        println!("   ⚠️  {}", msg);
        report.warnings.push(msg);
    }
    if audit.invalid_amount_rows > 0 {
        let msg = match policy {
            UnresolvedPolicy::Null => format!(
                "{} expense row(s) have no numeric amount: their fact rows are marked invalid with a NULL expense_reporting",
                audit.invalid_amount_rows
            ),
            UnresolvedPolicy::Exclude => format!(
                "{} expense row(s) have no numeric amount and were excluded from the sums",
                audit.invalid_amount_rows
            ),
        };
        warn!("{}", msg);
        println!("   ⚠️  {}", msg);
        report.warnings.push(msg);
    }
    if audit.orphan_entity_rows > 0 {
        let msg = format!(
            "{} fact row(s) have no project row (null dimension attributes)",
            audit.orphan_entity_rows
        );
        println!("   ⚠️  {}", msg);
        report.warnings.push(msg);
    }
    if audit.rows_outside_calendar > 0 {
        let msg = format!(
            "{} fact row(s) fall outside the calendar horizon",
            audit.rows_outside_calendar
        );
        println!("   ⚠️  {}", msg);
        report.warnings.push(msg);
    }
}
