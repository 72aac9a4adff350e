//! Root Audit - Cross-Checking a Production Root Scan
//!
//! A [`RootAudit`] captures the root set the verifier enumerates and
//! compares it with the references a production scan reported for the same
//! walk. References may legitimately appear more than once (the same object
//! held by a handle and by a stack slot); a reference counts as duplicated
//! only when the scan reported it more often than the verifier found it,
//! and undercounted when the scan reported it less often but at least once.

use super::{RootVerifier, WalkKind, WalkStats};
use crate::error::{Result, VerifyError};
use crate::logging::{self, VerifyEvent};
use crate::roots::RootCategory;
use indexmap::IndexMap;

/// Expected root set of one walk
#[derive(Debug, Clone)]
pub struct RootAudit {
    kind: WalkKind,
    /// Reference → (first category seen, multiplicity)
    expected: IndexMap<usize, (RootCategory, usize)>,
    stats: WalkStats,
    check_duplicates: bool,
    verbose: bool,
}

/// Differences between the expected and observed root sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Expected but never observed
    pub missing: Vec<usize>,
    /// Observed but not a root
    pub unexpected: Vec<usize>,
    /// Observed more often than expected
    pub duplicated: Vec<usize>,
    /// Observed, but fewer times than expected
    pub undercounted: Vec<usize>,
}

impl RootAudit {
    /// Run a walk of `kind` and record every reference with its category
    pub fn capture(verifier: &RootVerifier<'_>, kind: WalkKind) -> Self {
        let mut expected: IndexMap<usize, (RootCategory, usize)> = IndexMap::new();
        let stats = verifier.walk_categorized(kind, &mut |category, oop| {
            expected.entry(oop).or_insert((category, 0)).1 += 1;
        });

        log::debug!(
            "Captured {} distinct roots for {} audit",
            expected.len(),
            kind
        );

        Self {
            kind,
            expected,
            stats,
            check_duplicates: verifier.config().audit_duplicates,
            verbose: verifier.config().verbose,
        }
    }

    pub fn kind(&self) -> WalkKind {
        self.kind
    }

    /// Statistics of the captured walk
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Number of distinct expected references
    pub fn len(&self) -> usize {
        self.expected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    /// Category a reference was first found in
    pub fn category_of(&self, oop: usize) -> Option<RootCategory> {
        self.expected.get(&oop).map(|&(category, _)| category)
    }

    /// Compare with the references a production scan visited
    pub fn compare(&self, observed: &[usize]) -> AuditReport {
        let mut seen: IndexMap<usize, usize> = IndexMap::with_capacity(observed.len());
        for &oop in observed {
            *seen.entry(oop).or_insert(0) += 1;
        }

        let mut report = AuditReport::default();

        for &oop in self.expected.keys() {
            if !seen.contains_key(&oop) {
                report.missing.push(oop);
            }
        }

        for (&oop, &times) in &seen {
            match self.expected.get(&oop) {
                None => report.unexpected.push(oop),
                Some(&(_, expected)) if times < expected => report.undercounted.push(oop),
                Some(&(_, expected)) if self.check_duplicates && times > expected => {
                    report.duplicated.push(oop)
                },
                Some(_) => {},
            }
        }

        if !report.is_clean() {
            log::warn!(
                "{} audit: {} missing, {} unexpected, {} duplicated, {} undercounted",
                self.kind,
                report.missing.len(),
                report.unexpected.len(),
                report.duplicated.len(),
                report.undercounted.len()
            );
            if self.verbose {
                logging::log_event(VerifyEvent::RootMismatch {
                    missing: report.missing.len(),
                    unexpected: report.unexpected.len(),
                    duplicated: report.duplicated.len(),
                    undercounted: report.undercounted.len(),
                });
            }
        }

        report
    }
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.unexpected.is_empty()
            && self.duplicated.is_empty()
            && self.undercounted.is_empty()
    }

    /// Ok for a clean report, [`VerifyError::RootMismatch`] otherwise
    pub fn into_result(self) -> Result<()> {
        if self.is_clean() {
            return Ok(());
        }
        Err(VerifyError::RootMismatch {
            missing: self.missing,
            unexpected: self.unexpected,
            duplicated: self.duplicated,
            undercounted: self.undercounted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VerifierConfig;
    use crate::roots::RootTypes;
    use crate::runtime::VmRoots;

    fn vm() -> VmRoots {
        let vm = VmRoots::new();
        vm.code_cache.register("a", vec![0x100, 0x200]);
        vm.handles.make_global(0x200);
        vm.handles.make_vm_global(0x300);
        vm
    }

    #[test]
    fn test_clean_audit() {
        let vm = vm();
        let verifier = RootVerifier::new(RootTypes::ALL_ROOTS, vm.sources());
        let _scope = vm.safepoint.synchronize();

        let audit = RootAudit::capture(&verifier, WalkKind::Full);
        assert_eq!(audit.len(), 3);
        assert_eq!(audit.category_of(0x200), Some(RootCategory::Code));

        // 0x200 is held by both code and a handle.
        let report = audit.compare(&[0x300, 0x200, 0x100, 0x200]);
        assert!(report.is_clean());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_mismatch_report() {
        let vm = vm();
        let verifier = RootVerifier::new(RootTypes::ALL_ROOTS, vm.sources());
        let _scope = vm.safepoint.synchronize();

        let audit = RootAudit::capture(&verifier, WalkKind::Strong);
        let report = audit.compare(&[0x100, 0x100, 0x200, 0x999]);

        assert_eq!(report.missing, vec![0x300]);
        assert_eq!(report.unexpected, vec![0x999]);
        assert_eq!(report.duplicated, vec![0x100]);
        assert_eq!(report.undercounted, vec![0x200]);

        let err = report.into_result().expect_err("mismatch");
        assert!(err.is_bug());
    }

    #[test]
    fn test_duplicate_check_can_be_disabled() {
        let vm = vm();
        let config = VerifierConfig {
            audit_duplicates: false,
            ..Default::default()
        };
        let verifier = RootVerifier::with_config(RootTypes::CODE_ROOTS, vm.sources(), config)
            .expect("valid config");

        let audit = {
            let _held = vm.code_cache.lock().lock();
            RootAudit::capture(&verifier, WalkKind::Filtered)
        };
        assert!(audit.compare(&[0x100, 0x100, 0x200]).is_clean());
    }

    #[test]
    fn test_shared_reference_seen_once_is_undercounted() {
        let vm = vm();
        let verifier = RootVerifier::new(RootTypes::ALL_ROOTS, vm.sources());
        let _scope = vm.safepoint.synchronize();

        let audit = RootAudit::capture(&verifier, WalkKind::Full);
        let report = audit.compare(&[0x100, 0x200, 0x300]);

        assert!(report.missing.is_empty());
        assert!(report.duplicated.is_empty());
        assert_eq!(report.undercounted, vec![0x200]);
        assert!(!report.is_clean());
    }
}
