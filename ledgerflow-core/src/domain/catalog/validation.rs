// ledgerflow-core/src/domain/catalog/validation.rs

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::entity::{EntityCode, EntityDeclaration, EntitySource, SourceConventions};
use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum CatalogIssue {
    Empty,
    InvalidCode {
        code: String,
        pattern: String,
    },
    DuplicateCode {
        code: String,
    },
    /// Declared file name differs from the convention (e.g. `KEO2_budget.csv` for `KE02`).
    ConventionMismatch {
        code: String,
        kind: String,
        declared: String,
        expected: String,
    },
    MissingFile {
        code: String,
        kind: String,
        path: String,
    },
}

impl CatalogIssue {
    /// Errors always stop the run. Convention mismatches and missing files are
    /// warnings unless `strict` is set.
    pub fn is_fatal(&self, strict: bool) -> bool {
        match self {
            CatalogIssue::Empty
            | CatalogIssue::InvalidCode { .. }
            | CatalogIssue::DuplicateCode { .. } => true,
            CatalogIssue::ConventionMismatch { .. } | CatalogIssue::MissingFile { .. } => strict,
        }
    }
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogIssue::Empty => f.write_str("the catalog declares no entity"),
            CatalogIssue::InvalidCode { code, pattern } => {
                write!(f, "entity code '{}' does not match {}", code, pattern)
            }
            CatalogIssue::DuplicateCode { code } => {
                write!(f, "entity code '{}' is declared more than once", code)
            }
            CatalogIssue::ConventionMismatch {
                code,
                kind,
                declared,
                expected,
            } => write!(
                f,
                "{}: {} file '{}' does not follow the convention (expected '{}')",
                code, kind, declared, expected
            ),
            CatalogIssue::MissingFile { code, kind, path } => {
                write!(f, "{}: {} file not found at '{}'", code, kind, path)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogReport {
    pub issues: Vec<CatalogIssue>,
}

impl CatalogReport {
    pub fn fatal(&self, strict: bool) -> impl Iterator<Item = &CatalogIssue> {
        self.issues.iter().filter(move |i| i.is_fatal(strict))
    }

    pub fn warnings(&self, strict: bool) -> impl Iterator<Item = &CatalogIssue> {
        self.issues.iter().filter(move |i| !i.is_fatal(strict))
    }

    pub fn has_fatal(&self, strict: bool) -> bool {
        self.fatal(strict).next().is_some()
    }

    /// Turns fatal issues into a single error.
    pub fn into_result(self, strict: bool) -> Result<Self, DomainError> {
        let fatal: Vec<String> = self.fatal(strict).map(ToString::to_string).collect();
        if fatal.is_empty() {
            Ok(self)
        } else {
            Err(DomainError::CatalogInvalid(fatal.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityCatalog {
    entities: Vec<EntitySource>,
}

impl EntityCatalog {
    /// Validates the declarations and resolves their paths.
    ///
    /// Invalid and duplicate codes are left out of the catalog and reported.
    pub fn build(
        declarations: &[EntityDeclaration],
        conventions: &SourceConventions,
    ) -> Result<(Self, CatalogReport), DomainError> {
        let code_re = Regex::new(&conventions.code_pattern).map_err(|e| {
            DomainError::CatalogInvalid(format!(
                "code-pattern '{}' is not a valid regex: {}",
                conventions.code_pattern, e
            ))
        })?;

        let mut report = CatalogReport::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut entities = Vec::with_capacity(declarations.len());

        if declarations.is_empty() {
            report.issues.push(CatalogIssue::Empty);
        }

        for decl in declarations {
            let code = decl.code.trim().to_string();

            if !code_re.is_match(&code) {
                report.issues.push(CatalogIssue::InvalidCode {
                    code,
                    pattern: conventions.code_pattern.clone(),
                });
                continue;
            }
            if !seen.insert(code.clone()) {
                report.issues.push(CatalogIssue::DuplicateCode { code });
                continue;
            }

            let database = resolve_path(
                &code,
                "database",
                decl.database.as_deref(),
                &conventions.database_for(&code),
                &mut report,
            );
            let budget = resolve_path(
                &code,
                "budget",
                decl.budget.as_deref(),
                &conventions.budget_for(&code),
                &mut report,
            );

            entities.push(EntitySource {
                code: EntityCode::new_unchecked(code),
                database,
                budget,
            });
        }

        Ok((Self { entities }, report))
    }

    pub fn entities(&self) -> &[EntitySource] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Reports declared files that do not exist under `base_dir`.
    pub fn check_presence(&self, base_dir: &Path) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        for entity in &self.entities {
            for (kind, path) in [("database", &entity.database), ("budget", &entity.budget)] {
                let full = base_dir.join(path);
                if !full.exists() {
                    issues.push(CatalogIssue::MissingFile {
                        code: entity.code.to_string(),
                        kind: kind.to_string(),
                        path: full.display().to_string(),
                    });
                }
            }
        }
        issues
    }
}

fn resolve_path(
    code: &str,
    kind: &str,
    declared: Option<&str>,
    expected: &str,
    report: &mut CatalogReport,
) -> PathBuf {
    match declared {
        None => PathBuf::from(expected),
        Some(declared) => {
            let declared_path = PathBuf::from(declared);
            let declared_name = declared_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let expected_name = Path::new(expected)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            if declared_name != expected_name {
                report.issues.push(CatalogIssue::ConventionMismatch {
                    code: code.to_string(),
                    kind: kind.to_string(),
                    declared: declared.to_string(),
                    expected: expected_name,
                });
            }
            declared_path
        }
    }
}
