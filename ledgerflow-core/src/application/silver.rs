// ledgerflow-core/src/application/silver.rs

use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::application::context::StageContext;
use crate::application::engine::{execute_query, fetch_rows, fetch_strings};
use crate::application::report::StageReport;
use crate::domain::cleaning::normalize_label;
use crate::domain::compiler::SqlQuoter;
use crate::domain::error::DomainError;
use crate::domain::layer::{Artifact, Layer};
use crate::error::LedgerflowError;
use crate::ports::artifact_store::ArtifactStore;
use crate::ports::connector::{CellValue, Connector};

pub const LABEL_MAP: &str = "work_silver_labels";
const LABEL_COLUMNS: [&str; 2] = ["department", "category"];
const SAMPLE_LIMIT: usize = 5;

/// How one period table (expenses or budgets) is cleaned.
#[derive(Debug, Clone)]
pub struct PeriodTableSpec {
    pub source: Artifact,
    pub target: Artifact,
    /// Trimmed and upper-cased.
    pub currency_column: Option<String>,
    /// Coerced to DOUBLE.
    pub measure_column: String,
}

impl PeriodTableSpec {
    fn required_columns(&self) -> Vec<&str> {
        let mut cols = vec!["entity_code", "year", "month", "department", "category"];
        if let Some(currency) = &self.currency_column {
            cols.push(currency);
        }
        cols.push(&self.measure_column);
        cols
    }
}

/// Silver: type coercion, label normalization and date derivation, one cleaned
/// table per bronze table. Re-running it on its own output changes nothing.
#[instrument(skip_all)]
pub async fn run_silver(
    ctx: &StageContext<'_>,
    connector: &dyn Connector,
    store: &dyn ArtifactStore,
) -> Result<StageReport, LedgerflowError> {
    let start = Instant::now();
    let mut report = StageReport::new(Layer::Silver);
    let columns = &ctx.config.columns;
    println!("🥈 Silver: cleaning bronze tables");

    let expenses = PeriodTableSpec {
        source: Artifact::bronze_expenses(),
        target: Artifact::silver_expenses(),
        currency_column: Some(columns.currency.clone()),
        measure_column: columns.amount_local.clone(),
    };
    let budgets = PeriodTableSpec {
        source: Artifact::bronze_budgets(),
        target: Artifact::silver_budgets(),
        currency_column: None,
        measure_column: columns.budget_amount.clone(),
    };

    // 1. Lecture + contrôles (rien n'est écrit si une table est invalide)
    let projects_rel = store.read(&Artifact::bronze_projects()).await?;
    let mut relations = Vec::new();
    for layout in [&expenses, &budgets] {
        let relation = store.read(&layout.source).await?;
        check_required_columns(connector, &relation, &layout.required_columns()).await?;
        validate_periods(connector, &relation).await?;
        relations.push(relation);
    }

    // 2. Labels: one mapping shared by both tables
    let labels = build_label_map(connector, &relations).await?;
    info!(labels, "Label map built");

    // 3. Nettoyage
    for (layout, relation) in [&expenses, &budgets].into_iter().zip(&relations) {
        let (sql, warnings) = clean_period_table(connector, relation, layout).await?;
        report.warnings.extend(warnings);
        let work = layout.target.work_relation();
        execute_query(connector, &sql).await?;
        let info = store.write(&layout.target, &work).await?;
        println!("   💾 {} ({} rows)", info.name, info.rows);
        report.artifacts.push(info);
    }

    let projects = Artifact::silver_projects();
    let work = projects.work_relation();
    execute_query(
        connector,
        &format!(
            "CREATE OR REPLACE TABLE {} AS SELECT DISTINCT * FROM {};",
            SqlQuoter::ident(&work),
            SqlQuoter::ident(&projects_rel)
        ),
    )
    .await?;
    let info = store.write(&projects, &work).await?;
    println!("   💾 {} ({} rows)", info.name, info.rows);
    report.artifacts.push(info);

    for warning in &report.warnings {
        println!("   ⚠️  {}", warning);
    }

    report.duration_ms = start.elapsed().as_millis();
    report.save(&ctx.target_dir())?;
    info!(duration_ms = report.duration_ms, "Silver finished");
    Ok(report)
}

async fn check_required_columns(
    connector: &dyn Connector,
    relation: &str,
    required: &[&str],
) -> Result<(), LedgerflowError> {
    let present: BTreeSet<String> = connector
        .fetch_columns(relation)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|c| !present.contains(*c))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DomainError::SchemaError(format!(
            "'{}' lacks required column(s): {}",
            relation,
            missing.join(", ")
        ))
        .into())
    }
}

/// Fails the stage when any row has a `year`/`month` that is not an integer,
/// or a month outside 1..=12. No row is silently dropped.
pub async fn validate_periods(
    connector: &dyn Connector,
    relation: &str,
) -> Result<(), LedgerflowError> {
    let predicate = "TRY_CAST(\"year\" AS INTEGER) IS NULL \
         OR TRY_CAST(\"month\" AS INTEGER) IS NULL \
         OR TRY_CAST(\"month\" AS INTEGER) NOT BETWEEN 1 AND 12";
    let rel = SqlQuoter::ident(relation);

    let invalid = connector
        .query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE {}", rel, predicate))
        .await?;
    if invalid == 0 {
        return Ok(());
    }

    let samples = fetch_rows(
        connector,
        &format!(
            "SELECT CAST(entity_code AS VARCHAR), CAST(\"year\" AS VARCHAR), CAST(\"month\" AS VARCHAR) \
             FROM {} WHERE {} LIMIT {}",
            rel, predicate, SAMPLE_LIMIT
        ),
    )
    .await?;
    let samples = samples
        .rows
        .iter()
        .map(|row| {
            let cell = |i: usize| row.get(i).map(CellValue::to_string).unwrap_or_default();
            format!("{} {}/{}", cell(0), cell(1), cell(2))
        })
        .collect::<Vec<_>>()
        .join(", ");

    Err(DomainError::PeriodCoercion {
        relation: relation.to_string(),
        invalid_rows: invalid,
        samples,
    }
    .into())
}

/// Loads `raw -> normalized` for every distinct department/category value of
/// the given relations into `LABEL_MAP`. Returns the number of labels.
pub async fn build_label_map(
    connector: &dyn Connector,
    relations: &[String],
) -> Result<usize, LedgerflowError> {
    let selects: Vec<String> = relations
        .iter()
        .flat_map(|rel| {
            LABEL_COLUMNS.iter().map(move |col| {
                format!(
                    "SELECT CAST({} AS VARCHAR) AS raw FROM {}",
                    SqlQuoter::ident(col),
                    SqlQuoter::ident(rel)
                )
            })
        })
        .collect();

    let raw_values = if selects.is_empty() {
        Vec::new()
    } else {
        fetch_strings(
            connector,
            &format!(
                "SELECT DISTINCT raw FROM ({}) WHERE raw IS NOT NULL ORDER BY raw",
                selects.join(" UNION ALL ")
            ),
        )
        .await?
    };

    execute_query(
        connector,
        &format!(
            "CREATE OR REPLACE TABLE {} (raw VARCHAR, label VARCHAR);",
            LABEL_MAP
        ),
    )
    .await?;

    let rows: Vec<Vec<CellValue>> = raw_values
        .into_iter()
        .map(|raw| {
            let label = normalize_label(&raw);
            vec![CellValue::Text(raw), CellValue::Text(label)]
        })
        .collect();
    connector.load_rows(LABEL_MAP, &rows).await?;
    Ok(rows.len())
}

/// Builds the `CREATE TABLE` cleaning one period table. Columns keep their
/// order; an existing `date` is recomputed from year/month.
pub async fn clean_period_table(
    connector: &dyn Connector,
    relation: &str,
    layout: &PeriodTableSpec,
) -> Result<(String, Vec<String>), LedgerflowError> {
    let columns = connector.fetch_columns(relation).await?;
    let mut warnings = Vec::new();

    let year = "CAST(t.\"year\" AS INTEGER)";
    let month = "CAST(t.\"month\" AS INTEGER)";

    let mut projection = Vec::with_capacity(columns.len() + 1);
    for column in &columns {
        let name = column.name.as_str();
        let out = SqlQuoter::ident(name);
        let src = SqlQuoter::qualified("t", name);
        let expr = match name {
            "date" => continue,
            "year" => format!("{} AS {}", year, out),
            "month" => format!("{} AS {}", month, out),
            "department" => format!("dep.label AS {}", out),
            "category" => format!("cat.label AS {}", out),
            _ if layout.currency_column.as_deref() == Some(name) => {
                format!("upper(trim(CAST({} AS VARCHAR))) AS {}", src, out)
            }
            _ if name == layout.measure_column => {
                let lost = connector
                    .query_scalar(&format!(
                        "SELECT COUNT(*) FROM {} t WHERE {} IS NOT NULL AND TRY_CAST({} AS DOUBLE) IS NULL",
                        SqlQuoter::ident(relation),
                        src,
                        src
                    ))
                    .await?;
                if lost > 0 {
                    warn!(relation, column = name, lost, "Non-numeric amounts set to NULL");
                    warnings.push(format!(
                        "{}: {} non-numeric value(s) in '{}' set to NULL",
                        relation, lost, name
                    ));
                }
                format!("TRY_CAST({} AS DOUBLE) AS {}", src, out)
            }
            _ => format!("{} AS {}", src, out),
        };
        projection.push(expr);
    }
    projection.push(format!("make_date({}, {}, 1) AS \"date\"", year, month));

    let sql = format!(
        "CREATE OR REPLACE TABLE {work} AS \
         SELECT {projection} \
         FROM {rel} t \
         LEFT JOIN {labels} dep ON dep.raw = CAST(t.\"department\" AS VARCHAR) \
         LEFT JOIN {labels} cat ON cat.raw = CAST(t.\"category\" AS VARCHAR);",
        work = SqlQuoter::ident(&layout.target.work_relation()),
        projection = projection.join(", "),
        rel = SqlQuoter::ident(relation),
        labels = LABEL_MAP,
    );
    Ok((sql, warnings))
}
