//! Edit-session state machine.
//!
//! Two axes: which representation the operator is editing (structured form or
//! raw text) and whether local edits are not yet saved. The pair drives three
//! decisions, each encoded as a method so the policy lives in one place:
//! whose raw text wins when a snapshot arrives, whether a mutation refreshes
//! the raw text, and which payload a save sends.

use serde::Serialize;
use std::fmt;

/// Which representation the operator is editing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Form,
    Raw,
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditMode::Form => f.write_str("form"),
            EditMode::Raw => f.write_str("raw"),
        }
    }
}

/// Where the session's raw text comes from when a snapshot is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSource {
    /// The snapshot's raw text replaces the local text.
    Snapshot,
    /// Unsaved form edits win; the local form re-serializes into raw.
    LocalForm,
}

/// Mode and dirtiness of one editing session. Starts clean in form mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditState {
    mode: EditMode,
    dirty: bool,
}

impl EditState {
    #[must_use]
    pub fn mode(self) -> EditMode {
        self.mode
    }

    #[must_use]
    pub fn dirty(self) -> bool {
        self.dirty
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    /// A local mutation happened and is not yet saved.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// A save or apply was accepted by the gateway.
    pub fn mark_synced(&mut self) {
        self.dirty = false;
    }

    /// Raw-text precedence on snapshot arrival. Only unsaved form edits
    /// shield the local text; raw mode always shows what the gateway holds.
    #[must_use]
    pub fn raw_source(self) -> RawSource {
        match (self.mode, self.dirty) {
            (EditMode::Raw, _) | (EditMode::Form, false) => RawSource::Snapshot,
            (EditMode::Form, true) => RawSource::LocalForm,
        }
    }

    /// Whether a path mutation re-serializes the raw text immediately.
    #[must_use]
    pub fn refreshes_raw_on_edit(self) -> bool {
        self.mode == EditMode::Form
    }

    /// Whether a save serializes the local form instead of sending the raw
    /// text verbatim. Independent of dirtiness: a clean form still sends its
    /// canonical serialization.
    #[must_use]
    pub fn sends_form_payload(self) -> bool {
        self.mode == EditMode::Form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(mode: EditMode, dirty: bool) -> EditState {
        let mut edit = EditState::default();
        edit.set_mode(mode);
        if dirty {
            edit.mark_dirty();
        }
        edit
    }

    #[test]
    fn starts_clean_in_form_mode() {
        let edit = EditState::default();
        assert_eq!(edit.mode(), EditMode::Form);
        assert!(!edit.dirty());
    }

    #[test]
    fn mode_serializes_to_its_display_name() {
        // The JSON summary and the text summary must agree on the spelling.
        assert_eq!(serde_json::to_value(EditMode::Form).unwrap(), "form");
        assert_eq!(serde_json::to_value(EditMode::Raw).unwrap(), "raw");
        assert_eq!(EditMode::Raw.to_string(), "raw");
    }

    #[test]
    fn raw_source_covers_all_four_states() {
        let table = [
            (EditMode::Form, false, RawSource::Snapshot),
            (EditMode::Form, true, RawSource::LocalForm),
            (EditMode::Raw, false, RawSource::Snapshot),
            (EditMode::Raw, true, RawSource::Snapshot),
        ];
        for (mode, dirty, expected) in table {
            assert_eq!(
                state(mode, dirty).raw_source(),
                expected,
                "mode={mode} dirty={dirty}"
            );
        }
    }

    #[test]
    fn only_form_mode_refreshes_raw_on_edit() {
        assert!(state(EditMode::Form, true).refreshes_raw_on_edit());
        assert!(!state(EditMode::Raw, true).refreshes_raw_on_edit());
    }

    #[test]
    fn form_mode_sends_form_payload_even_when_clean() {
        assert!(state(EditMode::Form, false).sends_form_payload());
        assert!(state(EditMode::Form, true).sends_form_payload());
        assert!(!state(EditMode::Raw, true).sends_form_payload());
    }

    #[test]
    fn sync_clears_dirty_but_keeps_mode() {
        let mut edit = state(EditMode::Raw, true);
        edit.mark_synced();
        assert!(!edit.dirty());
        assert_eq!(edit.mode(), EditMode::Raw);
    }
}
