//! Lifecycle of one "add item" form: `idle → submitting → success | error`.

use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{error, info, instrument, warn};

use super::form::ItemForm;
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::models::item::{ItemId, ItemRecord};
use crate::store::ItemStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    /// Saved; the form is cleared once `clear_at` passes.
    Succeeded { id: ItemId, clear_at: Instant },
}

/// Transient message shown above the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Banner {
    Success { id: ItemId },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSettings {
    pub collection: String,
    pub timeout: Duration,
    pub success_display: Duration,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl SubmissionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            collection: config.collection.clone(),
            timeout: config.submit_timeout(),
            success_display: config.success_display(),
        }
    }
}

#[derive(Debug)]
struct FormState {
    form: ItemForm,
    state: SubmitState,
    banner: Option<Banner>,
}

/// Owns one form and submits it to an [`ItemStore`].
///
/// All methods take `&self`; the state lock is never held across the store
/// call, so the form can be read while a submission is in flight.
pub struct SubmissionWorkflow {
    store: Arc<dyn ItemStore>,
    settings: SubmissionSettings,
    inner: Mutex<FormState>,
}

impl SubmissionWorkflow {
    pub fn new(store: Arc<dyn ItemStore>, settings: SubmissionSettings) -> Self {
        Self {
            store,
            settings,
            inner: Mutex::new(FormState {
                form: ItemForm::default(),
                state: SubmitState::Idle,
                banner: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &SubmissionSettings {
        &self.settings
    }

    /// Applies a field edit.
    pub fn edit(&self, change: impl FnOnce(&mut ItemForm)) {
        change(&mut self.lock().form);
    }

    pub fn form(&self) -> ItemForm {
        self.lock().form.clone()
    }

    pub fn state(&self) -> SubmitState {
        self.lock().state.clone()
    }

    pub fn banner(&self) -> Option<Banner> {
        self.lock().banner.clone()
    }

    /// Whether the submit action is enabled right now.
    pub fn can_submit(&self) -> bool {
        let inner = self.lock();
        inner.state == SubmitState::Idle && inner.form.is_complete()
    }

    /// Validates the form and hands the new item to the store.
    ///
    /// Nothing reaches the store while the form is incomplete, while another
    /// submission is in flight, or while a success is still displayed.
    /// Store failures and timeouts return the workflow to idle with an error
    /// banner and the entered values intact.
    #[instrument(skip(self), fields(collection = %self.settings.collection))]
    pub async fn submit(&self) -> Result<ItemRecord, ServiceError> {
        let item = {
            let mut inner = self.lock();
            match inner.state {
                SubmitState::Submitting => {
                    warn!("submit ignored: a submission is already in flight");
                    return Err(ServiceError::SubmissionInProgress);
                }
                SubmitState::Succeeded { .. } => {
                    return Err(ServiceError::SubmissionDisabled(
                        "the previous item is still being confirmed".into(),
                    ));
                }
                SubmitState::Idle => {}
            }

            let valid = inner.form.check().map_err(|errors| {
                warn!(%errors, "submit blocked: form is incomplete");
                ServiceError::ValidationError(errors.to_string())
            })?;

            inner.state = SubmitState::Submitting;
            inner.banner = None;
            valid.to_stock_item(Utc::now())
        };

        let mut in_flight = InFlight {
            inner: &self.inner,
            armed: true,
        };
        let outcome = time::timeout(
            self.settings.timeout,
            self.store.create(&self.settings.collection, &item),
        )
        .await
        .unwrap_or_else(|_| {
            Err(ServiceError::Timeout(
                self.settings.timeout.as_millis() as u64,
            ))
        });
        in_flight.armed = false;

        let mut inner = self.lock();
        match outcome {
            Ok(id) => {
                info!(%id, name = %item.name, status = %item.status(), "item added");
                inner.state = SubmitState::Succeeded {
                    id: id.clone(),
                    clear_at: Instant::now() + self.settings.success_display,
                };
                inner.banner = Some(Banner::Success { id: id.clone() });
                Ok(ItemRecord::new(id, item))
            }
            Err(e) => {
                error!(error = %e, name = %item.name, "failed to add item");
                inner.state = SubmitState::Idle;
                inner.banner = Some(Banner::Error {
                    message: e.banner_message(),
                });
                Err(e)
            }
        }
    }

    /// Clears the form once the success display time has passed. Returns
    /// whether the form was cleared.
    pub fn tick(&self, now: Instant) -> bool {
        let mut inner = self.lock();
        match inner.state {
            SubmitState::Succeeded { clear_at, .. } if now >= clear_at => {
                inner.form.clear();
                inner.state = SubmitState::Idle;
                inner.banner = None;
                true
            }
            _ => false,
        }
    }

    /// Waits out the success display, then clears the form.
    pub async fn settle(&self) {
        let deadline = match self.lock().state {
            SubmitState::Succeeded { clear_at, .. } => clear_at,
            _ => return,
        };
        time::sleep_until(deadline).await;
        self.tick(Instant::now());
    }
}

/// Puts the form back to idle if a submission future is dropped before the
/// store answered.
struct InFlight<'a> {
    inner: &'a Mutex<FormState>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.state == SubmitState::Submitting {
                inner.state = SubmitState::Idle;
            }
        }
    }
}
