use super::domain::{Priority, SourceStatus};

/// Record creations that can move a source's status automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    IssueReported { priority: Priority },
    RepairLogged,
}

/// Status the source must take after `event`, if any.
///
/// Transitions are unconditional: the prior status is never consulted.
pub const fn derive_status(event: SourceEvent) -> Option<SourceStatus> {
    match event {
        SourceEvent::IssueReported {
            priority: Priority::High,
        } => Some(SourceStatus::Maintenance),
        SourceEvent::IssueReported { .. } => None,
        SourceEvent::RepairLogged => Some(SourceStatus::Operational),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_priority_issue_forces_maintenance() {
        assert_eq!(
            derive_status(SourceEvent::IssueReported {
                priority: Priority::High
            }),
            Some(SourceStatus::Maintenance)
        );
    }

    #[test]
    fn lower_priorities_leave_status_alone() {
        for priority in [Priority::Low, Priority::Medium] {
            assert_eq!(derive_status(SourceEvent::IssueReported { priority }), None);
        }
    }

    #[test]
    fn repairs_restore_operation() {
        assert_eq!(
            derive_status(SourceEvent::RepairLogged),
            Some(SourceStatus::Operational)
        );
    }
}
