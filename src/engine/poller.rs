use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::{Inner, LauncherController};

/// Periodic server refresh tied to an explicit start/stop pair.
///
/// The task only holds a weak reference to the controller so it never keeps
/// it alive. After [`StatusPoller::stop`] returns no further tick runs.
pub(super) struct StatusPoller {
    stop_flag: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl StatusPoller {
    pub(super) fn start(target: Weak<Inner>, period: Duration) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag = stop_flag.clone();
        let handle = tokio::spawn(async move {
            // The first refresh happens during initialization.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    debug!("poller: stop flag observed; skipping tick");
                    break;
                }
                let Some(inner) = target.upgrade() else {
                    debug!("poller: controller dropped");
                    break;
                };
                let controller = LauncherController { inner };
                if controller.is_shut_down() {
                    break;
                }
                controller.refresh_server_status().await;
            }
        });
        debug!("poller: started with period {:?}", period);
        Self { stop_flag, handle }
    }

    pub(super) async fn stop(self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.handle.abort();
        // Cancellation errors are expected here.
        let _ = self.handle.await;
        debug!("poller: stopped");
    }
}
