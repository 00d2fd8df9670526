//! View Tracker - detached post view recording.

use std::sync::Arc;

use crate::domain::auth::Session;
use crate::ports::{PostView, ViewRecorder};

use super::BackgroundTasks;

#[derive(Clone)]
pub struct ViewTracker {
    recorder: Arc<dyn ViewRecorder>,
    background: Arc<BackgroundTasks>,
}

impl ViewTracker {
    pub fn new(recorder: Arc<dyn ViewRecorder>, background: Arc<BackgroundTasks>) -> Self {
        Self {
            recorder,
            background,
        }
    }

    /// Records `view` and bumps the post's counter without waiting.
    ///
    /// The counter is bumped even when the view row could not be written.
    /// Failures are logged and dropped.
    pub fn track(&self, caller: Option<Session>, view: PostView) {
        let recorder = self.recorder.clone();
        self.background.spawn("record_view", async move {
            let post_id = view.post_id;
            if let Err(e) = recorder.record_view(caller.as_ref(), &view).await {
                tracing::warn!(%post_id, error = %e, "Failed to record post view");
            }
            if let Err(e) = recorder.increment_views(caller.as_ref(), post_id).await {
                tracing::warn!(%post_id, error = %e, "Failed to increment view count");
            }
        });
    }
}
