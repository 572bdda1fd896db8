use crate::state::SiteStatus;

/// Tracks the in-memory progress of one site during a crawl run
///
/// The scheduler keeps one of these per site for the lifetime of a run. It
/// counts outstanding page tasks and guarantees that the site reaches a
/// terminal status exactly once, no matter whether the last task finishes,
/// a fetch fails, or the run is stopped.
#[derive(Debug, Clone, Default)]
pub struct SiteProgress {
    /// Number of page tasks submitted but not yet finished
    outstanding: usize,

    /// Terminal status already decided for this run, if any
    resolved: Option<SiteStatus>,
}

impl SiteProgress {
    /// Creates progress for a site that is about to be crawled
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status the site currently has within this run
    #[cfg(test)]
    pub(crate) fn status(&self) -> SiteStatus {
        self.resolved.unwrap_or(SiteStatus::Indexing)
    }

    #[cfg(test)]
    fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Records that a page task was submitted for this site
    pub fn task_started(&mut self) {
        self.outstanding += 1;
    }

    /// Records that a page task finished
    ///
    /// # Returns
    ///
    /// * `Some(SiteStatus::Indexed)` - This was the last outstanding task and
    ///   the site has not failed; the caller must persist the transition
    /// * `None` - Tasks remain, or the site already reached a terminal status
    pub fn task_finished(&mut self) -> Option<SiteStatus> {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.outstanding == 0 && self.resolved.is_none() {
            self.resolved = Some(SiteStatus::Indexed);
            return self.resolved;
        }
        None
    }

    /// Marks the site as failed
    ///
    /// Returns true only for the first terminal transition, so the caller
    /// records the error message once.
    pub fn mark_failed(&mut self) -> bool {
        self.resolve(SiteStatus::Failed)
    }

    /// Marks a still-indexing site as interrupted
    ///
    /// Returns true if the site was still indexing and must be persisted as
    /// FAILED; sites that already finished are left untouched.
    pub fn interrupt(&mut self) -> bool {
        self.resolve(SiteStatus::Failed)
    }

    fn resolve(&mut self, status: SiteStatus) -> bool {
        if self.resolved.is_some() {
            return false;
        }
        self.resolved = Some(status);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress() -> SiteProgress {
        SiteProgress::new()
    }

    #[test]
    fn test_new_site_is_indexing() {
        let progress = progress();
        assert_eq!(progress.status(), SiteStatus::Indexing);
        assert_eq!(progress.outstanding(), 0);
    }

    #[test]
    fn test_last_task_resolves_indexed() {
        let mut progress = progress();
        progress.task_started();
        progress.task_started();

        assert_eq!(progress.task_finished(), None);
        assert_eq!(progress.task_finished(), Some(SiteStatus::Indexed));
        assert_eq!(progress.status(), SiteStatus::Indexed);
    }

    #[test]
    fn test_failure_is_reported_once() {
        let mut progress = progress();
        progress.task_started();
        progress.task_started();

        assert!(progress.mark_failed());
        assert!(!progress.mark_failed());
        assert_eq!(progress.task_finished(), None);
        assert_eq!(progress.task_finished(), None);
        assert_eq!(progress.status(), SiteStatus::Failed);
    }

    #[test]
    fn test_interrupt_only_affects_indexing_sites() {
        let mut finished = progress();
        finished.task_started();
        finished.task_finished();
        assert!(!finished.interrupt());
        assert_eq!(finished.status(), SiteStatus::Indexed);

        let mut running = progress();
        running.task_started();
        assert!(running.interrupt());
        assert_eq!(running.status(), SiteStatus::Failed);
        assert_eq!(running.task_finished(), None);
    }

    #[test]
    fn test_finish_without_start_saturates() {
        let mut progress = progress();
        assert_eq!(progress.task_finished(), Some(SiteStatus::Indexed));
        assert_eq!(progress.outstanding(), 0);
    }
}
