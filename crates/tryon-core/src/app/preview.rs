//! PreviewScheduler - debounced live preview during garment selection.
//!
//! Every selection change advances a request token. A non-empty selection
//! (re)arms a settle timer; when it fires with the token unchanged, one
//! `compose_preview` call is dispatched on a detached task. A result is only
//! applied if the token it was dispatched with is still the latest, so a
//! younger request always wins even when an older one resolves later.
//!
//! `loading` stays asserted while any dispatched call is outstanding, even
//! one whose result will be discarded. Showing the plain photo (`seed`,
//! `deactivate`, `reset`) clears it.
//!
//! Observers follow `PreviewState` through a `watch` channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{EncodedImage, GarmentItem, OutfitSelection, UserPhoto};
use crate::ports::GenerationGateway;

/// What the preview pane shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewImage {
    /// The user's photo as taken, nothing composed onto it.
    Plain(UserPhoto),
    Composite(EncodedImage),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewState {
    pub image: Option<PreviewImage>,
    /// A compose call for the latest selection is outstanding.
    pub loading: bool,
    token: u64,
    in_flight: u32,
}

impl PreviewState {
    pub fn token(&self) -> u64 {
        self.token
    }
}

pub struct PreviewScheduler {
    gateway: Arc<dyn GenerationGateway>,
    settle_delay: Duration,
    state: Arc<watch::Sender<PreviewState>>,
    timer: Option<JoinHandle<()>>,
}

impl PreviewScheduler {
    pub fn new(gateway: Arc<dyn GenerationGateway>, settle_delay: Duration) -> Self {
        let (state, _) = watch::channel(PreviewState::default());
        Self {
            gateway,
            settle_delay,
            state: Arc::new(state),
            timer: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PreviewState {
        self.state.borrow().clone()
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Show the plain photo, discarding anything pending.
    pub fn seed(&mut self, photo: &UserPhoto) {
        self.abort_timer();
        let photo = photo.clone();
        self.state.send_modify(|s| {
            s.token += 1;
            s.image = Some(PreviewImage::Plain(photo));
            s.loading = false;
        });
    }

    /// React to a new selection. Must be called from within a Tokio runtime.
    pub fn selection_changed(&mut self, photo: &UserPhoto, selection: &OutfitSelection) {
        if selection.is_empty() {
            debug!("selection empty, showing plain photo");
            self.seed(photo);
            return;
        }

        self.abort_timer();
        let mut token = 0;
        self.state.send_modify(|s| {
            s.token += 1;
            s.loading = s.in_flight > 0;
            token = s.token;
        });

        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);
        let photo = photo.clone();
        let items = selection.items();
        let delay = self.settle_delay;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = state.send_if_modified(|s| {
                if s.token != token {
                    return false;
                }
                s.in_flight += 1;
                s.loading = true;
                true
            });
            if current {
                // Detached: later changes discard the result, never the call.
                tokio::spawn(dispatch(gateway, state, photo, items, token));
            }
        }));
    }

    /// Stop scheduling. The last image stays visible.
    pub fn deactivate(&mut self) {
        self.abort_timer();
        self.state.send_modify(|s| {
            s.token += 1;
            s.loading = false;
        });
    }

    /// Forget everything, including the last image.
    pub fn reset(&mut self) {
        self.abort_timer();
        self.state.send_modify(|s| {
            s.token += 1;
            s.loading = false;
            s.image = None;
        });
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for PreviewScheduler {
    fn drop(&mut self) {
        self.abort_timer();
    }
}

async fn dispatch(
    gateway: Arc<dyn GenerationGateway>,
    state: Arc<watch::Sender<PreviewState>>,
    photo: UserPhoto,
    items: Vec<GarmentItem>,
    token: u64,
) {
    debug!(token, items = items.len(), "dispatching preview");
    let result = gateway.compose_preview(&photo, &items).await;

    state.send_if_modified(|s| {
        s.in_flight = s.in_flight.saturating_sub(1);
        if s.token != token {
            debug!(token, latest = s.token, "discarding stale preview");
            // Only ever clears: the plain-photo paths may have cleared it already.
            let was_loading = s.loading;
            s.loading = was_loading && s.in_flight > 0;
            return was_loading != s.loading;
        }
        s.loading = s.in_flight > 0;
        s.image = Some(match result {
            Ok(image) => PreviewImage::Composite(image),
            Err(e) => {
                warn!(error = %e, "preview failed, showing plain photo");
                PreviewImage::Plain(photo)
            }
        });
        true
    });
}
