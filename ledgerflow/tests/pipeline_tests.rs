use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use datafusion::arrow::array::{Array, Float64Array, Int64Array};
use datafusion::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const CONFIG: &str = "\
name: finance
reporting-currency: EUR
storage-root: warehouse
sources:
  entities:
    - code: BE01
    - code: KE02
fx:
  provider: static
  static-rates:
    USD: 0.9
";

/// A project with two entities: BE01 (EUR + USD expenses) and KE02 (KES, no rate).
struct LedgerflowTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

/// Storage of the generated entity databases.
#[derive(Clone, Copy)]
enum Store {
    DuckDb,
    Sqlite,
}

impl LedgerflowTestEnv {
    fn new(config: &str) -> Result<Self> {
        Self::with_store(config, Store::DuckDb)
    }

    fn with_store(config: &str, store: Store) -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().join("finance");
        fs::create_dir_all(&root)?;
        fs::write(root.join("ledgerflow.yaml"), config)?;

        Self::seed_database(
            store,
            &root.join("BE01.db"),
            "INSERT INTO project VALUES (1, 'Water', 'Belgium');
             INSERT INTO expenses VALUES (2024, 3, 'Ops', 'Travel', 'EUR', 100.0),
                                         (2024, 3, 'Ops', 'Travel', 'usd', 100.0);",
        )?;
        Self::seed_database(
            store,
            &root.join("KE02.db"),
            "INSERT INTO project VALUES (2, 'Roads', 'Kenya');
             INSERT INTO expenses VALUES (2024, 4, 'Field', 'Fuel', 'KES', 5000.0);",
        )?;
        fs::write(
            root.join("BE01_budget.csv"),
            "year,month,department,category,budget_amount_reporting\n2024,3,Ops,Travel,150\n",
        )?;
        fs::write(
            root.join("KE02_budget.csv"),
            "year,month,department,category,budget_amount_reporting\n2024,4,Field,Fuel,40\n",
        )?;

        Ok(Self { _tmp: tmp, root })
    }

    fn seed_database(store: Store, path: &Path, rows: &str) -> Result<()> {
        let schema = "CREATE TABLE project (project_id INTEGER, name VARCHAR, country VARCHAR);
             CREATE TABLE expenses (year INTEGER, month INTEGER, department VARCHAR,
                                    category VARCHAR, currency VARCHAR, amount_local DOUBLE);";
        // Connections dropped at the end of the scope, before the CLI opens the file.
        match store {
            Store::DuckDb => {
                let conn = duckdb::Connection::open(path)?;
                conn.execute_batch(schema)?;
                conn.execute_batch(rows)?;
            }
            Store::Sqlite => {
                let conn = rusqlite::Connection::open(path)?;
                conn.execute_batch(schema)?;
                conn.execute_batch(rows)?;
            }
        }
        Ok(())
    }

    fn ledgerflow(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ledgerflow"));
        cmd.current_dir(&self.root);
        cmd
    }

    fn artifact(&self, layer: &str, name: &str) -> PathBuf {
        self.root
            .join("warehouse")
            .join(format!("{}_outputs", layer))
            .join(format!("{}.parquet", name))
    }

    async fn fact_context(&self) -> Result<SessionContext> {
        let ctx = SessionContext::new();
        let path = self.artifact("gold", "gold_fact");
        ctx.register_parquet(
            "fact",
            path.to_str().context("non UTF-8 path")?,
            ParquetReadOptions::default(),
        )
        .await?;
        Ok(ctx)
    }
}

async fn scalar_i64(ctx: &SessionContext, sql: &str) -> Result<i64> {
    let batches = ctx.sql(sql).await?.collect().await?;
    let batch = batches.first().context("empty result")?;
    let values = batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .context("expected an Int64 column")?;
    Ok(values.value(0))
}

async fn scalar_f64(ctx: &SessionContext, sql: &str) -> Result<Option<f64>> {
    let batches = ctx.sql(sql).await?.collect().await?;
    let batch = batches.first().context("empty result")?;
    let values = batch
        .column(0)
        .as_any()
        .downcast_ref::<Float64Array>()
        .context("expected a Float64 column")?;
    Ok((!values.is_null(0)).then(|| values.value(0)))
}

#[tokio::test]
async fn test_run_builds_consolidated_fact() -> Result<()> {
    let env = LedgerflowTestEnv::new(CONFIG)?;

    env.ledgerflow()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"));

    for (layer, name) in [
        ("bronze", "bronze_expenses"),
        ("silver", "silver_budgets"),
        ("gold", "gold_dim_date"),
        ("gold", "gold_dim_project"),
        ("gold", "gold_fx_rates"),
    ] {
        assert!(env.artifact(layer, name).exists(), "{} missing", name);
    }
    assert!(env.root.join("target/run_results.json").exists());
    assert!(env.root.join("target/gold_report.json").exists());

    let ctx = env.fact_context().await?;

    // One row per (date, entity, department, category)
    assert_eq!(scalar_i64(&ctx, "SELECT COUNT(*) FROM fact").await?, 2);

    // 100 EUR + 100 USD * 0.9
    let be01 = scalar_f64(
        &ctx,
        "SELECT CAST(expense_reporting AS DOUBLE) FROM fact WHERE entity_code = 'BE01'",
    )
    .await?;
    assert_eq!(be01, Some(190.0));

    let be01_budget = scalar_f64(
        &ctx,
        "SELECT CAST(budget_reporting AS DOUBLE) FROM fact WHERE entity_code = 'BE01'",
    )
    .await?;
    assert_eq!(be01_budget, Some(150.0));

    // KES has no rate: the budget survives, the expense is flagged
    let ke02 = scalar_f64(
        &ctx,
        "SELECT CAST(expense_reporting AS DOUBLE) FROM fact WHERE entity_code = 'KE02'",
    )
    .await?;
    assert_eq!(ke02, None);
    assert_eq!(
        scalar_i64(
            &ctx,
            "SELECT COUNT(*) FROM fact WHERE entity_code = 'KE02' \
             AND expense_status = 'unresolved' AND budget_status = 'present'"
        )
        .await?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn test_run_over_sqlite_sources() -> Result<()> {
    let config = CONFIG.replace("sources:\n", "sources:\n  format: sqlite\n");
    let env = LedgerflowTestEnv::with_store(&config, Store::Sqlite)?;

    env.ledgerflow().arg("run").assert().success();

    let ctx = env.fact_context().await?;
    assert_eq!(scalar_i64(&ctx, "SELECT COUNT(*) FROM fact").await?, 2);
    let be01 = scalar_f64(
        &ctx,
        "SELECT CAST(expense_reporting AS DOUBLE) FROM fact WHERE entity_code = 'BE01'",
    )
    .await?;
    assert_eq!(be01, Some(190.0));
    Ok(())
}

#[tokio::test]
async fn test_run_is_idempotent() -> Result<()> {
    let env = LedgerflowTestEnv::new(CONFIG)?;

    env.ledgerflow().arg("run").assert().success();
    env.ledgerflow().arg("run").assert().success();

    let ctx = env.fact_context().await?;
    assert_eq!(scalar_i64(&ctx, "SELECT COUNT(*) FROM fact").await?, 2);

    let staged = fs::read_dir(env.root.join("warehouse/gold_outputs"))?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) != Some("parquet"))
        .count();
    assert_eq!(staged, 0, "temporary files left behind");
    Ok(())
}

#[test]
fn test_layers_run_one_by_one() -> Result<()> {
    let env = LedgerflowTestEnv::new(CONFIG)?;

    // Silver needs bronze artifacts first
    env.ledgerflow().arg("silver").assert().failure();

    env.ledgerflow().arg("bronze").assert().success();
    env.ledgerflow().arg("silver").assert().success();
    env.ledgerflow()
        .arg("gold")
        .assert()
        .success()
        .stdout(predicate::str::contains("gold_fact"));
    Ok(())
}

#[test]
fn test_missing_budget_skipped_by_default() -> Result<()> {
    let env = LedgerflowTestEnv::new(CONFIG)?;
    fs::remove_file(env.root.join("KE02_budget.csv"))?;

    env.ledgerflow()
        .arg("bronze")
        .assert()
        .success()
        .stdout(predicate::str::contains("KE02"));
    Ok(())
}

#[test]
fn test_missing_source_aborts_when_configured() -> Result<()> {
    let config = CONFIG.replace("sources:\n", "sources:\n  on-missing: abort\n");
    let env = LedgerflowTestEnv::new(&config)?;
    fs::remove_file(env.root.join("KE02_budget.csv"))?;

    env.ledgerflow()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input missing for entity KE02"));

    assert!(!env.artifact("gold", "gold_fact").exists());
    Ok(())
}

#[test]
fn test_catalog_reports_convention_mismatch() -> Result<()> {
    let config = CONFIG.replace(
        "    - code: KE02\n",
        "    - code: KE02\n      budget: KEO2_budget.csv\n",
    );
    let env = LedgerflowTestEnv::new(&config)?;

    env.ledgerflow()
        .args(["catalog", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("does not follow the convention"))
        .stdout(predicate::str::contains("BE01"));

    let strict = config.replace("sources:\n", "sources:\n  strict: true\n");
    fs::write(env.root.join("ledgerflow.yaml"), strict)?;
    env.ledgerflow()
        .args(["catalog", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fatal catalog issue"));
    Ok(())
}

#[test]
fn test_inspect_and_clean() -> Result<()> {
    let env = LedgerflowTestEnv::new(CONFIG)?;

    env.ledgerflow()
        .args(["inspect", "gold_fact"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Have you run"));

    env.ledgerflow().arg("run").assert().success();
    env.ledgerflow()
        .args(["inspect", "gold_fx_rates", "--limit", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("multiplier"))
        .stdout(predicate::str::contains("USD"));

    env.ledgerflow().arg("clean").assert().success();
    assert!(!env.root.join("warehouse/gold_outputs").exists());
    assert!(!env.root.join("target").exists());
    // Sources are never touched
    assert!(env.root.join("BE01.db").exists());
    Ok(())
}
