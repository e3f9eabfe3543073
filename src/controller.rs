use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::ConsoleConfig;
use crate::draft::{DraftStore, TokenDraft, AUTO_GROUP};
use crate::error::ConsoleError;
use crate::models::group::GroupOption;
use crate::services::expiry;
use crate::services::token_service::{self, SubmitMode};

/// Form lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Closed,
    Loading,
    Ready,
    Submitting,
}

/// Field-visibility rules derived from the draft. Pure; re-evaluate on every
/// state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldVisibility {
    /// Absolute-expiration fields are hidden for deferred tokens that have
    /// not started counting yet.
    pub hide_expiration: bool,
    /// Relative-duration fields show for deferred tokens or daily caps.
    pub show_duration_fields: bool,
}

pub fn compute_visibility(draft: &TokenDraft) -> FieldVisibility {
    FieldVisibility {
        hide_expiration: draft.start_on_first_use && draft.first_used_time == 0,
        show_duration_fields: draft.start_on_first_use || draft.daily_quota_limit > 0,
    }
}

/// Result of an edit-mode load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// The session was closed while the fetch was in flight; the response
    /// was discarded.
    Stale,
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Every unit (or the single update) was accepted.
    Completed { success_count: u32 },
    /// Batch creation stopped early but at least one unit was accepted.
    /// Accepted units are not rolled back.
    Partial { success_count: u32, error: String },
    /// The session was closed mid-submission; no further units were sent.
    Stale,
}

/// Closes the owning session from another task, invalidating any in-flight
/// load or submit.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    generation: Arc<AtomicU64>,
}

impl CloseHandle {
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Orchestrates one token form session: load, visibility, payload assembly,
/// submission, and the session-identity guard against late responses.
pub struct TokenFormController {
    client: ApiClient,
    config: ConsoleConfig,
    store: DraftStore,
    phase: FormPhase,
    editing_id: Option<i64>,
    session_id: Uuid,
    generation: Arc<AtomicU64>,
}

impl TokenFormController {
    pub fn new(config: ConsoleConfig) -> Self {
        let client = ApiClient::new(&config);
        let store = DraftStore::new(&config);
        Self {
            client,
            config,
            store,
            phase: FormPhase::Closed,
            editing_id: None,
            session_id: Uuid::new_v4(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn draft(&self) -> &TokenDraft {
        &self.store.draft
    }

    pub fn draft_mut(&mut self) -> &mut TokenDraft {
        &mut self.store.draft
    }

    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DraftStore {
        &mut self.store
    }

    pub fn is_edit(&self) -> bool {
        self.editing_id.is_some()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Handle for closing this session from elsewhere while a request is
    /// outstanding.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            generation: self.generation.clone(),
        }
    }

    fn begin_session(&mut self) -> u64 {
        self.session_id = Uuid::new_v4();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn discard_session(&mut self) {
        self.editing_id = None;
        self.store = DraftStore::new(&self.config);
        self.phase = FormPhase::Closed;
    }

    /// Open the form on fresh defaults.
    pub fn open_for_create(&mut self) {
        self.begin_session();
        self.editing_id = None;
        self.store = DraftStore::new(&self.config);
        self.phase = FormPhase::Ready;
        tracing::debug!(session = %self.session_id, "token form opened in create mode");
    }

    /// Open the form on an existing record. On a fetch failure the message is
    /// surfaced and the form stays open on defaults.
    pub async fn open_for_edit(&mut self, id: i64) -> Result<LoadOutcome, ConsoleError> {
        let generation = self.begin_session();
        self.editing_id = Some(id);
        self.phase = FormPhase::Loading;
        tracing::debug!(session = %self.session_id, "loading token {id}");

        let fetched = self.client.get_token(id).await;
        if !self.is_current(generation) {
            tracing::debug!("discarding stale load of token {id}");
            self.discard_session();
            return Ok(LoadOutcome::Stale);
        }
        match fetched {
            Ok(record) => {
                self.store.replace(TokenDraft::hydrate(record));
                self.phase = FormPhase::Ready;
                Ok(LoadOutcome::Loaded)
            }
            Err(e) => {
                self.store = DraftStore::new(&self.config);
                self.phase = FormPhase::Ready;
                Err(e)
            }
        }
    }

    /// Discard the draft and close the session.
    pub fn close(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.discard_session();
        tracing::debug!(session = %self.session_id, "token form closed");
    }

    /// Apply a quick-select expiration preset to the draft.
    pub fn apply_expiry_preset(&mut self, months: i64, days: i64, hours: i64, minutes: i64) {
        self.store.draft.expired_time = expiry::preset_expiry(Utc::now(), months, days, hours, minutes);
    }

    /// Model names available to the account.
    pub async fn load_model_options(&self) -> Result<Vec<String>, ConsoleError> {
        self.client.get_models().await
    }

    /// Selectable groups, with the "auto" entry ensured and sorted first when
    /// the policy flag is set. In create mode the policy also seeds the
    /// draft's group.
    pub async fn load_group_options(&mut self) -> Result<Vec<GroupOption>, ConsoleError> {
        let catalog = self.client.get_groups().await?;
        let mut options: Vec<GroupOption> = catalog
            .into_iter()
            .map(|(value, info)| GroupOption {
                label: if info.desc.is_empty() {
                    value.clone()
                } else {
                    info.desc
                },
                ratio: Some(info.ratio),
                value,
            })
            .collect();
        if self.config.default_use_auto_group {
            if options.iter().any(|option| option.value == AUTO_GROUP) {
                options.sort_by_key(|option| option.value != AUTO_GROUP);
            } else {
                options.insert(
                    0,
                    GroupOption {
                        value: AUTO_GROUP.to_string(),
                        label: "auto-select".to_string(),
                        ratio: None,
                    },
                );
            }
            if self.editing_id.is_none() {
                self.store.draft.group = AUTO_GROUP.to_string();
            }
        }
        Ok(options)
    }

    /// Submit the draft: one update in edit mode, `token_count` sequential
    /// creates otherwise. A local validation failure sends nothing.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ConsoleError> {
        if self.phase != FormPhase::Ready {
            return Err(ConsoleError::Validation("no form is ready to submit".into()));
        }
        let generation = self.generation.load(Ordering::SeqCst);
        self.phase = FormPhase::Submitting;
        match self.editing_id {
            Some(id) => self.submit_edit(id, generation).await,
            None => self.submit_create(generation).await,
        }
    }

    async fn submit_edit(
        &mut self,
        id: i64,
        generation: u64,
    ) -> Result<SubmitOutcome, ConsoleError> {
        let payload =
            match token_service::build_payload(&self.store.draft, SubmitMode::Edit { id }, Utc::now())
            {
                Ok(payload) => payload,
                Err(e) => {
                    self.phase = FormPhase::Ready;
                    return Err(e);
                }
            };

        let sent = self.client.update_token(&payload).await;
        if !self.is_current(generation) {
            tracing::debug!("discarding stale update of token {id}");
            self.discard_session();
            return Ok(SubmitOutcome::Stale);
        }
        match sent {
            Ok(()) => {
                tracing::info!("token {id} updated");
                self.end_session();
                Ok(SubmitOutcome::Completed { success_count: 1 })
            }
            Err(e) => {
                // draft kept untouched for correction
                self.phase = FormPhase::Ready;
                Err(e)
            }
        }
    }

    async fn submit_create(&mut self, generation: u64) -> Result<SubmitOutcome, ConsoleError> {
        // a zero count falls back to one, mirroring the original console
        let count = self.store.draft.token_count.max(1);
        if self.store.draft.token_count == 0 {
            tracing::debug!("token_count 0 treated as 1");
        }
        let base = self.store.draft.name.clone();

        let mut success_count = 0u32;
        let mut first_error: Option<ConsoleError> = None;
        for index in 0..count as usize {
            let mut unit = self.store.draft.clone();
            unit.name = token_service::batch_name(&base, index);
            let payload =
                match token_service::build_payload(&unit, SubmitMode::Create, Utc::now()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        first_error = Some(e);
                        break;
                    }
                };

            let sent = self.client.create_token(&payload).await;
            if !self.is_current(generation) {
                tracing::debug!("submission raced a close; {success_count} tokens kept");
                self.discard_session();
                return Ok(SubmitOutcome::Stale);
            }
            match sent {
                Ok(()) => {
                    success_count += 1;
                    tracing::debug!("created token {}/{count}", index + 1);
                }
                Err(e) => {
                    first_error = Some(e);
                    break;
                }
            }
        }

        if success_count > 0 {
            tracing::info!("created {success_count} of {count} tokens");
            self.end_session();
            match first_error {
                None => Ok(SubmitOutcome::Completed { success_count }),
                Some(error) => Ok(SubmitOutcome::Partial {
                    success_count,
                    error: error.to_string(),
                }),
            }
        } else {
            self.phase = FormPhase::Ready;
            Err(first_error
                .unwrap_or_else(|| ConsoleError::Submit("no tokens were created".into())))
        }
    }

    fn end_session(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.discard_session();
    }
}
