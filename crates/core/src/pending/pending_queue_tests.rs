#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::pending::pending_model::{DeliveryOutcome, PendingState, RetryResolution};
    use crate::pending::pending_queue::{attempt_delivery, PendingQueue};
    use crate::positions::PositionRecord;
    use crate::scheduler::{ManualScheduler, TimerId};
    use crate::surface::{MockRenderingSurface, RenderedContent};

    const MAX_ATTEMPTS: u32 = 3;

    fn queue() -> PendingQueue {
        PendingQueue::new(Duration::from_millis(500), MAX_ATTEMPTS)
    }

    fn positions() -> Vec<PositionRecord> {
        vec![PositionRecord::new("sec-1"), PositionRecord::new("sec-2")]
    }

    #[test]
    fn test_attempt_delivery_outcomes() {
        let surface = MockRenderingSurface::new();
        assert_eq!(
            attempt_delivery(&surface, "p", &[], None),
            DeliveryOutcome::Missing
        );
        surface.mount("p", false);
        assert_eq!(
            attempt_delivery(&surface, "p", &[], None),
            DeliveryOutcome::Hidden
        );
        surface.mount("p", true);
        assert_eq!(
            attempt_delivery(&surface, "p", &[], Some("upstream failed")),
            DeliveryOutcome::Applied
        );
        match surface.last_write("p") {
            Some(RenderedContent::Error(view)) => {
                assert_eq!(view.message, "upstream failed");
                assert!(view.retryable);
            }
            other => panic!("Expected error content, got {:?}", other),
        }
    }

    #[test]
    fn test_ready_surface_applies_immediately() {
        let surface = MockRenderingSurface::new();
        surface.mount("p", true);
        let scheduler = ManualScheduler::new();
        let mut queue = queue();

        assert!(queue.deliver_or_queue(&surface, &scheduler, "p", positions(), None));
        assert!(queue.is_empty());
        assert_eq!(scheduler.scheduled_total(), 0);
        assert_eq!(surface.write_count(), 1);
    }

    #[test]
    fn test_hidden_surface_queues_and_arms_timer() {
        let surface = MockRenderingSurface::new();
        surface.mount("p", false);
        let scheduler = ManualScheduler::new();
        let mut queue = queue();

        assert!(!queue.deliver_or_queue(&surface, &scheduler, "p", positions(), None));
        let entry = queue.get("p").unwrap();
        assert_eq!(entry.attempts, 0);
        assert_eq!(entry.state, PendingState::Queued);
        assert_eq!(entry.last_outcome, DeliveryOutcome::Hidden);
        assert_eq!(scheduler.armed().len(), 1);
        assert_eq!(scheduler.armed()[0].delay, Duration::from_millis(500));
    }

    #[test]
    fn test_newer_update_replaces_queued_entry() {
        let surface = MockRenderingSurface::new();
        let scheduler = ManualScheduler::new();
        let mut queue = queue();

        queue.deliver_or_queue(&surface, &scheduler, "p", positions(), None);
        let first_timer = scheduler.armed()[0].id;
        queue.deliver_or_queue(&surface, &scheduler, "p", vec![], Some("later".to_string()));

        assert_eq!(queue.len(), 1);
        let entry = queue.get("p").unwrap();
        assert!(entry.positions.is_empty());
        assert_eq!(entry.error.as_deref(), Some("later"));
        let armed = scheduler.armed();
        assert_eq!(armed.len(), 1);
        assert_ne!(armed[0].id, first_timer);

        // The replaced timer is stale if it still fires
        assert_eq!(
            queue.on_retry(&surface, &scheduler, "p", first_timer),
            RetryResolution::Stale
        );
    }

    #[test]
    fn test_retry_applies_once_surface_ready() {
        let surface = MockRenderingSurface::new();
        let scheduler = ManualScheduler::new();
        let mut queue = queue();
        queue.deliver_or_queue(&surface, &scheduler, "p", positions(), None);

        surface.mount("p", true);
        let timer = scheduler.take_armed().remove(0);
        assert_eq!(
            queue.on_retry(&surface, &scheduler, &timer.portfolio_uuid, timer.id),
            RetryResolution::Applied
        );
        assert!(queue.is_empty());
        assert!(scheduler.armed().is_empty());
        match surface.last_write("p") {
            Some(RenderedContent::Positions(view)) => assert_eq!(view.positions.len(), 2),
            other => panic!("Expected positions, got {:?}", other),
        }
    }

    #[test]
    fn test_retries_are_bounded() {
        let surface = MockRenderingSurface::new();
        let scheduler = ManualScheduler::new();
        let mut queue = queue();
        queue.deliver_or_queue(&surface, &scheduler, "p", positions(), None);

        let mut resolutions = Vec::new();
        while let Some(timer) = scheduler.take_armed().pop() {
            resolutions.push(queue.on_retry(&surface, &scheduler, "p", timer.id));
        }

        assert_eq!(
            resolutions,
            vec![
                RetryResolution::Requeued { attempts: 1 },
                RetryResolution::Requeued { attempts: 2 },
                RetryResolution::Dropped { attempts: 3 },
            ]
        );
        assert!(queue.is_empty());
        assert!(scheduler.armed().is_empty());
        assert_eq!(scheduler.scheduled_total(), MAX_ATTEMPTS as usize);
        assert_eq!(surface.write_count(), 0);
    }

    #[test]
    fn test_flush_delivers_independent_of_timer() {
        let surface = MockRenderingSurface::new();
        surface.mount("p", false);
        let scheduler = ManualScheduler::new();
        let mut queue = queue();
        queue.deliver_or_queue(&surface, &scheduler, "p", positions(), None);

        assert_eq!(
            queue.flush(&surface, &scheduler, "p"),
            Some(DeliveryOutcome::Hidden)
        );
        assert_eq!(queue.get("p").unwrap().attempts, 0);
        assert_eq!(scheduler.armed().len(), 1);

        surface.mount("p", true);
        assert_eq!(
            queue.flush(&surface, &scheduler, "p"),
            Some(DeliveryOutcome::Applied)
        );
        assert!(queue.is_empty());
        assert!(scheduler.armed().is_empty());
        assert_eq!(queue.flush(&surface, &scheduler, "p"), None);
    }

    #[test]
    fn test_unknown_timer_is_stale() {
        let surface = MockRenderingSurface::new();
        let scheduler = ManualScheduler::new();
        let mut queue = queue();
        assert_eq!(
            queue.on_retry(&surface, &scheduler, "p", TimerId(99)),
            RetryResolution::Stale
        );
    }
}
