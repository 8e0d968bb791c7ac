//! Reconciliation controller for one gateway editing session.
//!
//! The controller keeps three representations of the gateway configuration
//! consistent: the raw text an operator can edit verbatim, the structured
//! document behind the channel forms, and the snapshot the gateway last
//! reported. Which representation wins at each boundary is decided by the
//! [`EditState`] machine; stale completions from overlapping round trips are
//! discarded by a monotonic snapshot watermark, so the session always settles
//! on the most recently issued operation. Saves are last-write-wins: the
//! gateway stores whatever raw text the session submits.
//!
//! Boundary operations record their outcome in [`SessionState::last_error`]
//! instead of returning it, mirroring how a renderer consumes the session:
//! every completion leaves the state displayable. Synchronous mutations
//! propagate serialization errors directly.

mod edit_state;
mod snapshot;

pub use edit_state::{EditMode, EditState, RawSource};
pub use snapshot::{ConfigSnapshot, SchemaInfo};

use crate::document::{self, PathSegment};
use crate::forms::ChannelForms;
use crate::transport::{methods, ControlTransport};
use anyhow::Result;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Status line shown beside every channel while validation fails.
pub const CONFIG_INVALID: &str = "Config invalid.";

/// Tokens pinned by gateway-side environment variables. Carried as display
/// hints only; the gateway ignores edits to pinned fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldLocks {
    pub telegram_token: bool,
    pub discord_token: bool,
    pub slack_bot_token: bool,
    pub slack_app_token: bool,
}

impl FieldLocks {
    /// Detect the pinning variables in this process's environment. Matches
    /// the gateway's own pinning rules, so the hints are accurate whenever
    /// the session shares the gateway host.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            telegram_token: env_pins("TELEGRAM_BOT_TOKEN"),
            discord_token: env_pins("DISCORD_BOT_TOKEN"),
            slack_bot_token: env_pins("SLACK_BOT_TOKEN"),
            slack_app_token: env_pins("SLACK_APP_TOKEN"),
        }
    }
}

fn env_pins(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| !value.trim().is_empty())
}

/// In-flight operation flags, one per boundary call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyFlags {
    pub loading: bool,
    pub saving: bool,
    pub applying: bool,
    pub updating: bool,
    pub schema_loading: bool,
}

/// Per-channel status lines derived from the last validation verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStatuses {
    pub telegram: Option<String>,
    pub discord: Option<String>,
    pub slack: Option<String>,
    pub signal: Option<String>,
    pub imessage: Option<String>,
}

impl ChannelStatuses {
    fn uniform(status: Option<String>) -> Self {
        Self {
            telegram: status.clone(),
            discord: status.clone(),
            slack: status.clone(),
            signal: status.clone(),
            imessage: status,
        }
    }
}

/// Everything a renderer needs about one editing session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub snapshot: Option<ConfigSnapshot>,
    pub raw: String,
    pub valid: Option<bool>,
    pub issues: Vec<Value>,
    pub local_form: Option<Value>,
    pub edit: EditState,
    pub forms: ChannelForms,
    pub statuses: ChannelStatuses,
    pub schema: SchemaInfo,
    pub flags: BusyFlags,
    pub last_error: Option<String>,
    /// Watermark of the newest applied snapshot-bearing operation.
    snapshot_seq: u64,
}

#[derive(Debug, Clone, Copy)]
enum SubmitOp {
    Save,
    Apply,
}

impl SubmitOp {
    fn method(self) -> &'static str {
        match self {
            SubmitOp::Save => methods::CONFIG_SET,
            SubmitOp::Apply => methods::CONFIG_APPLY,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            SubmitOp::Save => "save",
            SubmitOp::Apply => "apply",
        }
    }

    fn flag(self, flags: &mut BusyFlags) -> &mut bool {
        match self {
            SubmitOp::Save => &mut flags.saving,
            SubmitOp::Apply => &mut flags.applying,
        }
    }
}

/// One editing session against one gateway. All methods take `&self`; the
/// session lock is never held across an await.
pub struct ConfigController {
    transport: Arc<dyn ControlTransport>,
    session_key: String,
    locks: FieldLocks,
    state: Mutex<SessionState>,
    op_seq: AtomicU64,
}

impl ConfigController {
    pub fn new(transport: Arc<dyn ControlTransport>, session_key: impl Into<String>) -> Self {
        Self {
            transport,
            session_key: session_key.into(),
            locks: FieldLocks::default(),
            state: Mutex::new(SessionState::default()),
            op_seq: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_locks(mut self, locks: FieldLocks) -> Self {
        self.locks = locks;
        self
    }

    #[must_use]
    pub fn locks(&self) -> FieldLocks {
        self.locks
    }

    #[must_use]
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Cloned view of the session for rendering.
    #[must_use]
    pub fn session(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// Fetch the gateway's current snapshot and reconcile it into the
    /// session. Transport and decode failures land in `last_error`; a
    /// completion older than the watermark is dropped.
    pub async fn load(&self) {
        let ticket = self.next_ticket();
        {
            let mut state = self.state.lock();
            state.flags.loading = true;
            state.last_error = None;
        }

        let result = self.transport.request(methods::CONFIG_GET, json!({})).await;

        let mut state = self.state.lock();
        state.flags.loading = false;
        match result {
            Ok(value) => {
                if ticket <= state.snapshot_seq {
                    debug!(
                        ticket,
                        watermark = state.snapshot_seq,
                        "dropping stale config snapshot"
                    );
                    return;
                }
                state.snapshot_seq = ticket;
                let snapshot = ConfigSnapshot::from_value(value);
                if let Err(e) = apply_snapshot(&mut state, snapshot) {
                    state.last_error = Some(format!("{e:#}"));
                }
            }
            Err(e) => state.last_error = Some(format!("{e:#}")),
        }
    }

    /// Fetch the configuration schema and rendering hints. Re-entrant calls
    /// while one is in flight are ignored.
    pub async fn load_schema(&self) {
        {
            let mut state = self.state.lock();
            if state.flags.schema_loading {
                return;
            }
            state.flags.schema_loading = true;
        }

        let result = self
            .transport
            .request(methods::CONFIG_SCHEMA, json!({}))
            .await;

        let mut state = self.state.lock();
        state.flags.schema_loading = false;
        match result {
            Ok(value) => state.schema = SchemaInfo::from_value(value),
            Err(e) => state.last_error = Some(format!("{e:#}")),
        }
    }

    /// Persist the session's effective configuration (`config.set`).
    pub async fn save(&self) {
        self.submit(SubmitOp::Save).await;
    }

    /// Persist and restart affected channels (`config.apply`). The session
    /// key tells the gateway which session triggered the restart.
    pub async fn apply(&self) {
        self.submit(SubmitOp::Apply).await;
    }

    /// Trigger the gateway self-update.
    pub async fn run_update(&self) {
        {
            let mut state = self.state.lock();
            state.flags.updating = true;
            state.last_error = None;
        }

        let result = self
            .transport
            .request(
                methods::UPDATE_RUN,
                json!({ "sessionKey": self.session_key }),
            )
            .await;

        let mut state = self.state.lock();
        state.flags.updating = false;
        if let Err(e) = result {
            state.last_error = Some(format!("{e:#}"));
        }
    }

    /// Assign `value` at `path` in the local document. Marks the session
    /// dirty and, in form mode, refreshes the raw text from the result. A
    /// rejected path leaves the session untouched.
    pub fn set_value(&self, path: &[PathSegment], value: Value) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut base = effective_base(state);
        document::set_path(&mut base, path, value)?;
        debug!(path = %document::format_path(path), "updated local configuration value");
        state.local_form = Some(base);
        state.edit.mark_dirty();
        refresh_raw_from_form(state)
    }

    /// Remove the value at `path` from the local document. A miss is still an
    /// edit: the session goes dirty even when nothing was removed.
    pub fn remove_value(&self, path: &[PathSegment]) -> Result<bool> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut base = effective_base(state);
        let removed = document::remove_path(&mut base, path);
        if !removed {
            debug!(path = %document::format_path(path), "removal target absent");
        }
        state.local_form = Some(base);
        state.edit.mark_dirty();
        refresh_raw_from_form(state)?;
        Ok(removed)
    }

    /// Switch editing representation. Entering raw mode serializes the local
    /// form into the raw text so the text editor starts from the form edits.
    /// Entering form mode flips the flag only; the raw text cannot be parsed
    /// session-side, so the form catches up via [`Self::adopt_parsed_document`]
    /// or the next clean snapshot.
    pub fn set_mode(&self, mode: EditMode) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.edit.mode() == mode {
            return Ok(());
        }
        state.edit.set_mode(mode);
        debug!(%mode, "switched edit mode");
        if mode == EditMode::Raw {
            if let Some(form) = &state.local_form {
                state.raw = document::serialize_document(form)?;
            }
        }
        Ok(())
    }

    /// Install a document parsed elsewhere (the gateway parses raw text) as
    /// the local form. Dirtiness carries over: adopting a parse result is
    /// not an edit.
    pub fn adopt_parsed_document(&self, document: Value) {
        let mut state = self.state.lock();
        state.local_form = Some(document);
    }

    async fn submit(&self, op: SubmitOp) {
        let ticket = self.next_ticket();
        let payload = {
            let mut state = self.state.lock();
            *op.flag(&mut state.flags) = true;
            state.last_error = None;
            build_payload(&state)
        };
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                let mut state = self.state.lock();
                *op.flag(&mut state.flags) = false;
                state.last_error = Some(format!("{e:#}"));
                return;
            }
        };

        let params = match op {
            SubmitOp::Save => json!({ "raw": payload }),
            SubmitOp::Apply => json!({ "raw": payload, "sessionKey": self.session_key }),
        };
        match self.transport.request(op.method(), params).await {
            Ok(_) => {
                {
                    let mut state = self.state.lock();
                    state.edit.mark_synced();
                    // Older in-flight snapshots must not resurrect the edits
                    // this submission just persisted.
                    state.snapshot_seq = state.snapshot_seq.max(ticket);
                }
                self.load().await;
                let mut state = self.state.lock();
                if let Some(err) = &state.last_error {
                    warn!("config reload after {} failed: {err}", op.verb());
                }
                *op.flag(&mut state.flags) = false;
            }
            Err(e) => {
                let mut state = self.state.lock();
                *op.flag(&mut state.flags) = false;
                state.last_error = Some(format!("{e:#}"));
            }
        }
    }

    fn next_ticket(&self) -> u64 {
        self.op_seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Reconcile one decoded snapshot into the session under the precedence
/// rules of the edit state.
fn apply_snapshot(state: &mut SessionState, snapshot: ConfigSnapshot) -> Result<()> {
    let raw_from_snapshot = match &snapshot.raw {
        Some(raw) => raw.clone(),
        None => match &snapshot.document {
            doc @ (Value::Object(_) | Value::Array(_)) => document::serialize_document(doc)?,
            _ => state.raw.clone(),
        },
    };
    state.raw = match state.edit.raw_source() {
        RawSource::Snapshot => raw_from_snapshot,
        RawSource::LocalForm => match &state.local_form {
            Some(form) => document::serialize_document(form)?,
            None => raw_from_snapshot,
        },
    };

    state.valid = snapshot.valid;
    state.issues = snapshot.issues.clone();

    // Forms always track the gateway document, even mid-edit; unsaved edits
    // live in the local form and the raw text, not in the projections.
    state.forms = ChannelForms::from_document(&snapshot.document);
    let status = (snapshot.valid == Some(false)).then(|| CONFIG_INVALID.to_string());
    state.statuses = ChannelStatuses::uniform(status);

    if !state.edit.dirty() {
        state.local_form = Some(match &snapshot.document {
            Value::Null => Value::Object(Map::new()),
            doc => doc.clone(),
        });
    }
    state.snapshot = Some(snapshot);
    Ok(())
}

/// The document a mutation starts from: unsaved local form first, then the
/// last snapshot document, then an empty mapping.
fn effective_base(state: &SessionState) -> Value {
    if let Some(form) = &state.local_form {
        return form.clone();
    }
    match &state.snapshot {
        Some(snap) if !snap.document.is_null() => snap.document.clone(),
        _ => Value::Object(Map::new()),
    }
}

/// The raw text a save or apply submits.
fn build_payload(state: &SessionState) -> Result<String> {
    if state.edit.sends_form_payload() {
        if let Some(form) = &state.local_form {
            return document::serialize_document(form);
        }
    }
    Ok(state.raw.clone())
}

fn refresh_raw_from_form(state: &mut SessionState) -> Result<()> {
    if state.edit.refreshes_raw_on_edit() {
        if let Some(form) = &state.local_form {
            state.raw = document::serialize_document(form)?;
        }
    }
    Ok(())
}
