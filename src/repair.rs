//! Self-Repair Loop
//!
//! Drives drafting and validation as an explicit state machine:
//! Drafting → Validating → {Accepted, Repairing, Rejected}. Each repair pass
//! feeds the validator's findings back into the next draft. The attempt
//! budget is a hard bound; a collaborator that repeats the same mistake burns
//! through the budget and surfaces as Rejected, never as an endless loop.

use crate::adapters::{with_timeout, SqlDrafter};
use crate::config::RepairConfig;
use crate::validator::{has_errors, SqlValidator, ValidationFinding};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One drafting attempt inside the loop.
#[derive(Debug, Clone)]
pub struct SqlDraft {
    pub sql: String,
    pub attempt: usize,
    /// Findings from the previous attempt, empty on the first.
    pub prior_findings: Vec<ValidationFinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Accepted,
    /// Budget exhausted; `sql` is the last draft and is explicitly unverified.
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub sql: String,
    pub status: GenerationStatus,
    pub findings: Vec<ValidationFinding>,
    pub attempts: usize,
}

/// Typed transition out of the Validating state.
#[derive(Debug)]
enum Verdict {
    /// Carries the surviving warnings, if any.
    Accept(Vec<ValidationFinding>),
    Retry(Vec<ValidationFinding>),
    GiveUp(Vec<ValidationFinding>),
}

pub struct SelfRepairLoop {
    drafter: Arc<dyn SqlDrafter>,
    validator: SqlValidator,
    config: RepairConfig,
    adapter_timeout: Duration,
}

impl SelfRepairLoop {
    pub fn new(
        drafter: Arc<dyn SqlDrafter>,
        validator: SqlValidator,
        config: RepairConfig,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            drafter,
            validator,
            config,
            adapter_timeout,
        }
    }

    pub async fn run(&self, question: &str, schema_context: &str) -> crate::error::Result<Generation> {
        let mut prior_findings: Vec<ValidationFinding> = Vec::new();

        for attempt in 1..=self.config.max_attempts {
            debug!(attempt, "drafting");
            let sql = with_timeout(
                "sql-drafter",
                self.adapter_timeout,
                self.drafter.draft(question, schema_context, &prior_findings),
            )
            .await?;
            let draft = SqlDraft {
                sql,
                attempt,
                prior_findings: std::mem::take(&mut prior_findings),
            };

            let findings = self.validator.validate(&draft.sql);
            match self.assess(findings, attempt) {
                Verdict::Accept(findings) => {
                    info!(attempt, "SQL accepted");
                    return Ok(Generation {
                        sql: draft.sql,
                        status: GenerationStatus::Accepted,
                        findings,
                        attempts: attempt,
                    });
                }
                Verdict::Retry(findings) => {
                    warn!(
                        attempt,
                        errors = findings.iter().filter(|f| f.is_error()).count(),
                        "draft failed validation, repairing"
                    );
                    prior_findings = findings;
                }
                Verdict::GiveUp(findings) => {
                    warn!(attempt, "attempt budget exhausted, rejecting draft");
                    return Ok(Generation {
                        sql: draft.sql,
                        status: GenerationStatus::Rejected,
                        findings,
                        attempts: attempt,
                    });
                }
            }
        }
        unreachable!("loop always exits through Accept or GiveUp within the budget")
    }

    fn assess(&self, findings: Vec<ValidationFinding>, attempt: usize) -> Verdict {
        let acceptable = if self.config.accept_warnings {
            !has_errors(&findings)
        } else {
            findings.is_empty()
        };
        if acceptable {
            Verdict::Accept(findings)
        } else if attempt < self.config.max_attempts {
            Verdict::Retry(findings)
        } else {
            Verdict::GiveUp(findings)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn catalog() -> Arc<SchemaCatalog> {
        Arc::new(
            SchemaCatalog::from_json_str(
                r#"{
                    "tables": [
                        {
                            "name": "fact_orders",
                            "primary_key": ["crn_number"],
                            "columns": [
                                {"name": "crn_number", "data_type": "string"},
                                {"name": "order_status", "data_type": "string"}
                            ]
                        }
                    ]
                }"#,
            )
            .unwrap(),
        )
    }

    /// Returns canned SQL per attempt and records the feedback it was given.
    struct ScriptedDrafter {
        scripts: Vec<String>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedDrafter {
        fn new(scripts: Vec<&str>) -> Self {
            Self {
                scripts: scripts.into_iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SqlDrafter for ScriptedDrafter {
        async fn draft(
            &self,
            _question: &str,
            _schema_context: &str,
            prior_findings: &[ValidationFinding],
        ) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            let attempt = calls.len();
            calls.push(
                prior_findings
                    .iter()
                    .map(|f| f.category.as_str().to_string())
                    .collect(),
            );
            Ok(self
                .scripts
                .get(attempt.min(self.scripts.len() - 1))
                .cloned()
                .unwrap())
        }
    }

    fn repair_loop(drafter: Arc<dyn SqlDrafter>, max_attempts: usize) -> SelfRepairLoop {
        SelfRepairLoop::new(
            drafter,
            SqlValidator::new(catalog()),
            RepairConfig {
                max_attempts,
                accept_warnings: true,
            },
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_valid_first_draft_accepted() {
        let drafter = Arc::new(ScriptedDrafter::new(vec![
            "SELECT order_status FROM fact_orders",
        ]));
        let generation = repair_loop(drafter, 3).run("q", "ctx").await.unwrap();
        assert_eq!(generation.status, GenerationStatus::Accepted);
        assert_eq!(generation.attempts, 1);
        assert!(generation.findings.is_empty());
    }

    #[tokio::test]
    async fn test_constant_invalid_drafter_burns_exact_budget() {
        let drafter = Arc::new(ScriptedDrafter::new(vec![
            "SELECT ghost FROM no_such_table",
        ]));
        let generation = repair_loop(drafter.clone(), 3).run("q", "ctx").await.unwrap();
        assert_eq!(generation.status, GenerationStatus::Rejected);
        assert_eq!(generation.attempts, 3);
        assert!(has_errors(&generation.findings));
        // Exactly budget calls, no more.
        assert_eq!(drafter.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_findings_fed_back_to_next_draft() {
        let drafter = Arc::new(ScriptedDrafter::new(vec![
            "SELECT typo_col FROM fact_orders",
            "SELECT order_status FROM fact_orders",
        ]));
        let generation = repair_loop(drafter.clone(), 3).run("q", "ctx").await.unwrap();
        assert_eq!(generation.status, GenerationStatus::Accepted);
        assert_eq!(generation.attempts, 2);

        let calls = drafter.calls.lock().unwrap();
        assert!(calls[0].is_empty());
        assert_eq!(calls[1], vec!["unknown-column".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_carries_last_draft_and_errors() {
        let drafter = Arc::new(ScriptedDrafter::new(vec![
            "SELECT ghost FROM fact_orders",
        ]));
        let generation = repair_loop(drafter, 2).run("q", "ctx").await.unwrap();
        assert_eq!(generation.status, GenerationStatus::Rejected);
        assert_eq!(generation.sql, "SELECT ghost FROM fact_orders");
        assert!(generation
            .findings
            .iter()
            .any(|f| f.category.as_str() == "unknown-column"));
    }

    #[tokio::test]
    async fn test_warnings_only_accepted_by_default() {
        // Not a declared key pair, but that is only a warning.
        let drafter = Arc::new(ScriptedDrafter::new(vec![
            "SELECT o.order_status FROM fact_orders o JOIN fact_orders p ON o.order_status = p.crn_number",
        ]));
        let generation = repair_loop(drafter, 3).run("q", "ctx").await.unwrap();
        assert_eq!(generation.status, GenerationStatus::Accepted);
        assert!(!generation.findings.is_empty());
        assert!(!has_errors(&generation.findings));
    }
}
