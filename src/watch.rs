use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::audit::{audit, diff_reports, AuditDrift, AuditReport, AuditScope};
use crate::catalog::Catalog;
use crate::reconcile::OverrideStore;

#[derive(Debug, Clone)]
pub struct WatchInputs {
    pub catalog_path: PathBuf,
    pub overrides_path: PathBuf,
    pub scope: AuditScope,
}

#[derive(Debug, Clone)]
pub enum WatchEvent {
    Audited {
        iteration: u32,
        report: AuditReport,
        drift: Option<AuditDrift>,
    },
    Unchanged {
        iteration: u32,
    },
}

/// SHA-256 over the concatenated bytes of every input file.
pub fn fingerprint<P: AsRef<Path>>(paths: &[P]) -> Result<String> {
    let mut hasher = Sha256::new();
    for path in paths {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Re-audits whenever the catalog or override file content changes.
/// Unreadable inputs are logged and retried on the next iteration.
pub async fn run_watch_loop<F>(
    inputs: &WatchInputs,
    interval: Duration,
    iterations: u32,
    mut on_event: F,
) -> Result<()>
where
    F: FnMut(&WatchEvent),
{
    let mut last_fingerprint: Option<String> = None;
    let mut previous_report: Option<AuditReport> = None;

    let total_iterations = iterations.max(1);
    for i in 0..total_iterations {
        let iteration = i + 1;
        info!("watch iteration {iteration}");

        match audit_if_changed(inputs, last_fingerprint.as_deref()) {
            Ok(Some((fp, report))) => {
                let drift = previous_report
                    .as_ref()
                    .map(|previous| diff_reports(previous, &report));
                last_fingerprint = Some(fp);
                on_event(&WatchEvent::Audited {
                    iteration,
                    report: report.clone(),
                    drift,
                });
                previous_report = Some(report);
            }
            Ok(None) => {
                debug!("inputs unchanged, skipping audit");
                on_event(&WatchEvent::Unchanged { iteration });
            }
            Err(err) => warn!("watch iteration {iteration} failed: {err:#}"),
        }

        if iteration < total_iterations {
            tokio::time::sleep(interval).await;
        }
    }
    Ok(())
}

fn audit_if_changed(
    inputs: &WatchInputs,
    last_fingerprint: Option<&str>,
) -> Result<Option<(String, AuditReport)>> {
    let fp = fingerprint(&[&inputs.catalog_path, &inputs.overrides_path])?;
    if last_fingerprint == Some(fp.as_str()) {
        return Ok(None);
    }
    let catalog = Catalog::load(&inputs.catalog_path)?;
    let overrides = OverrideStore::load(&inputs.overrides_path)?;
    Ok(Some((fp, audit(&catalog, &overrides, &inputs.scope))))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use super::{fingerprint, run_watch_loop, WatchEvent, WatchInputs};
    use crate::audit::AuditScope;

    const CATALOG: &str = r#"{
        "institutions": [{"code": "A", "name": "Lycée A"}],
        "formations": [{"institution": "A", "category": "CPGE", "filiere_bis": "ECG"}],
        "paniers": [{"id": "p", "cpge_type": "ECG - Maths appliquées + HGG"}],
        "panier_stats": [{"panier_id": "p", "institution": "A"}]
    }"#;

    #[test]
    fn fingerprint_tracks_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        fs::write(&a, "[]").expect("write");
        fs::write(&b, "{}").expect("write");
        let first = fingerprint(&[&a, &b]).expect("fingerprint");
        assert_eq!(first, fingerprint(&[&a, &b]).expect("fingerprint"));
        fs::write(&b, "{ }").expect("write");
        assert_ne!(first, fingerprint(&[&a, &b]).expect("fingerprint"));
        assert!(fingerprint(&[&dir.path().join("missing")]).is_err());
    }

    #[tokio::test]
    async fn audits_once_while_inputs_are_stable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let inputs = WatchInputs {
            catalog_path: dir.path().join("catalog.json"),
            overrides_path: dir.path().join("overrides.json"),
            scope: AuditScope::default(),
        };
        fs::write(&inputs.catalog_path, CATALOG).expect("write catalog");
        fs::write(&inputs.overrides_path, "[]").expect("write overrides");

        let mut events = Vec::new();
        run_watch_loop(&inputs, Duration::ZERO, 3, |event| events.push(event.clone()))
            .await
            .expect("watch loop");

        assert_eq!(events.len(), 3);
        match &events[0] {
            WatchEvent::Audited { report, drift, .. } => {
                assert_eq!(report.totals.total_issues, 1);
                assert!(drift.is_none());
            }
            other => panic!("expected audit, got {other:?}"),
        }
        assert!(matches!(events[1], WatchEvent::Unchanged { iteration: 2 }));
        assert!(matches!(events[2], WatchEvent::Unchanged { iteration: 3 }));
    }
}
