//! Download orchestration: single-source attempts and ordered auto-fallback.

use tracing::{info, warn};

use crate::error::Result;
use crate::reference::ModelReference;
use crate::source::{HuggingFaceSource, ModelScopeSource, ModelSource, SourceKind};
use crate::store::ModelStore;

/// Sequences download attempts across the configured hub sources.
///
/// Holds one adapter per concrete hub; [`SourceKind::Auto`] walks them in
/// [`SourceKind::AUTO_ORDER`]. No attempt is retried with the same source in
/// one run, and there is no delay between fallback attempts: a failed source
/// is treated as unlikely to recover within this session.
pub struct Orchestrator {
    modelscope: Box<dyn ModelSource>,
    hf_mirror: Box<dyn ModelSource>,
    hf_official: Box<dyn ModelSource>,
}

impl Orchestrator {
    /// Orchestrator over the real hub clients.
    pub fn with_default_sources() -> Self {
        Self::new(
            Box::new(ModelScopeSource),
            Box::new(HuggingFaceSource::mirror()),
            Box::new(HuggingFaceSource::official()),
        )
    }

    /// Orchestrator over explicit sources, in auto-fallback order
    /// (ModelScope, mirror, official). Tests inject fakes here.
    pub fn new(
        modelscope: Box<dyn ModelSource>,
        hf_mirror: Box<dyn ModelSource>,
        hf_official: Box<dyn ModelSource>,
    ) -> Self {
        Self {
            modelscope,
            hf_mirror,
            hf_official,
        }
    }

    fn source_for(&self, kind: SourceKind) -> &dyn ModelSource {
        match kind {
            SourceKind::ModelScope => self.modelscope.as_ref(),
            SourceKind::HfMirror => self.hf_mirror.as_ref(),
            SourceKind::HfOfficial => self.hf_official.as_ref(),
            SourceKind::Auto => unreachable!("Auto is not a concrete source"),
        }
    }

    fn attempt(
        &self,
        reference: &ModelReference,
        store: &ModelStore,
        kind: SourceKind,
    ) -> Result<()> {
        let source = self.source_for(kind);
        let dest = store.model_dir(reference);
        info!(
            model = %reference,
            source = source.label(),
            dest = %dest.display(),
            "Starting download attempt"
        );
        source.fetch(reference.identifier(), &dest)
    }

    /// One attempt from one concrete source. Returns `true` iff it succeeded;
    /// [`SourceKind::Auto`] delegates to [`Orchestrator::download_auto`].
    pub fn download_single(
        &self,
        reference: &ModelReference,
        store: &ModelStore,
        kind: SourceKind,
    ) -> bool {
        if kind == SourceKind::Auto {
            return self.download_auto(reference, store);
        }
        match self.attempt(reference, store, kind) {
            Ok(()) => {
                info!(model = %reference, source = %kind, "Download finished");
                true
            }
            Err(e) => {
                warn!(model = %reference, source = %kind, "Download failed: {}", e);
                false
            }
        }
    }

    /// Try each source in the fixed fallback order, stopping at the first
    /// success. Each per-source failure is reported before moving on; a
    /// failure local to this machine (disk, storage root) ends the run at
    /// once, since no other hub can fix it. Returns `false` when no source
    /// succeeded.
    pub fn download_auto(&self, reference: &ModelReference, store: &ModelStore) -> bool {
        for kind in SourceKind::AUTO_ORDER {
            info!(source = %kind, "Auto mode: trying next source");
            match self.attempt(reference, store, kind) {
                Ok(()) => {
                    info!(model = %reference, source = %kind, "Download finished");
                    return true;
                }
                Err(e) if e.is_recoverable() => {
                    warn!(source = %kind, "Source failed, falling back: {}", e);
                }
                Err(e) => {
                    warn!(source = %kind, "Local failure, stopping fallback: {}", e);
                    return false;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::TempDir;

    // The orchestrator owns its sources, so attempts are counted through a
    // shared log.
    struct LoggingSource {
        label: &'static str,
        succeed: bool,
        log: std::rc::Rc<RefCell<Vec<&'static str>>>,
    }

    impl ModelSource for LoggingSource {
        fn label(&self) -> &'static str {
            self.label
        }

        fn fetch(&self, _identifier: &str, _dest: &Path) -> Result<()> {
            self.log.borrow_mut().push(self.label);
            if self.succeed {
                Ok(())
            } else {
                Err(FetchError::Transfer {
                    hub: self.label.to_string(),
                    message: "scripted failure".into(),
                })
            }
        }
    }

    fn logging_orchestrator(
        ms_ok: bool,
        mirror_ok: bool,
        official_ok: bool,
    ) -> (Orchestrator, std::rc::Rc<RefCell<Vec<&'static str>>>) {
        let log = std::rc::Rc::new(RefCell::new(Vec::new()));
        let orchestrator = Orchestrator::new(
            Box::new(LoggingSource {
                label: "ms",
                succeed: ms_ok,
                log: log.clone(),
            }),
            Box::new(LoggingSource {
                label: "mirror",
                succeed: mirror_ok,
                log: log.clone(),
            }),
            Box::new(LoggingSource {
                label: "official",
                succeed: official_ok,
                log: log.clone(),
            }),
        );
        (orchestrator, log)
    }

    fn fixture() -> (TempDir, ModelStore, ModelReference) {
        let tmp = TempDir::new().unwrap();
        let store = ModelStore::open(tmp.path()).unwrap();
        let reference = ModelReference::parse("Org/Model").unwrap();
        (tmp, store, reference)
    }

    #[test]
    fn test_single_success() {
        let (_tmp, store, reference) = fixture();
        let (orchestrator, log) = logging_orchestrator(true, false, false);
        assert!(orchestrator.download_single(&reference, &store, SourceKind::ModelScope));
        assert_eq!(*log.borrow(), vec!["ms"]);
    }

    #[test]
    fn test_single_failure_does_not_fall_back() {
        let (_tmp, store, reference) = fixture();
        let (orchestrator, log) = logging_orchestrator(false, true, true);
        assert!(!orchestrator.download_single(&reference, &store, SourceKind::ModelScope));
        assert_eq!(*log.borrow(), vec!["ms"]);
    }

    #[test]
    fn test_auto_stops_at_first_success() {
        let (_tmp, store, reference) = fixture();
        let (orchestrator, log) = logging_orchestrator(true, true, true);
        assert!(orchestrator.download_auto(&reference, &store));
        assert_eq!(*log.borrow(), vec!["ms"]);
    }

    #[test]
    fn test_auto_falls_through_in_fixed_order() {
        let (_tmp, store, reference) = fixture();
        let (orchestrator, log) = logging_orchestrator(false, false, true);
        assert!(orchestrator.download_auto(&reference, &store));
        assert_eq!(*log.borrow(), vec!["ms", "mirror", "official"]);
    }

    #[test]
    fn test_auto_all_fail_after_exactly_three_attempts() {
        let (_tmp, store, reference) = fixture();
        let (orchestrator, log) = logging_orchestrator(false, false, false);
        assert!(!orchestrator.download_auto(&reference, &store));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_auto_stops_on_local_failure() {
        // Disk trouble will hit every hub the same way, so auto mode gives
        // up instead of walking the rest of the order.
        struct DiskFailSource {
            log: std::rc::Rc<RefCell<Vec<&'static str>>>,
        }

        impl ModelSource for DiskFailSource {
            fn label(&self) -> &'static str {
                "ms"
            }

            fn fetch(&self, _identifier: &str, _dest: &Path) -> Result<()> {
                self.log.borrow_mut().push("ms");
                Err(FetchError::Io {
                    message: "no space left on device".into(),
                    path: None,
                    source: None,
                })
            }
        }

        let (_tmp, store, reference) = fixture();
        let log = std::rc::Rc::new(RefCell::new(Vec::new()));
        let orchestrator = Orchestrator::new(
            Box::new(DiskFailSource { log: log.clone() }),
            Box::new(LoggingSource {
                label: "mirror",
                succeed: true,
                log: log.clone(),
            }),
            Box::new(LoggingSource {
                label: "official",
                succeed: true,
                log: log.clone(),
            }),
        );
        assert!(!orchestrator.download_auto(&reference, &store));
        assert_eq!(*log.borrow(), vec!["ms"]);
    }

    #[test]
    fn test_download_single_with_auto_kind_falls_back() {
        let (_tmp, store, reference) = fixture();
        let (orchestrator, log) = logging_orchestrator(false, true, false);
        assert!(orchestrator.download_single(&reference, &store, SourceKind::Auto));
        assert_eq!(*log.borrow(), vec!["ms", "mirror"]);
    }
}
