//! FFI layer for native app shells.
//!
//! This module provides C-compatible functions that can be called from Swift
//! (or any other language with a C FFI). All structured data crosses the
//! boundary as JSON strings; timestamps are milliseconds since the Unix epoch.
//!
//! # Memory Management
//!
//! - Strings returned by `lingo_*` functions are allocated by Rust
//! - Caller must free them with `lingo_string_free`
//! - Store pointers must be freed with `lingo_store_free`
//!
//! # Error Handling
//!
//! Functions returning strings return JSON with either:
//! - `{"ok": <result>}` on success
//! - `{"error": "<message>"}` on failure
//!
//! Functions returning integers use `-1` for invalid arguments.

use crate::{GuestFeature, GuestSnapshot, GuestStore, KnowledgePointDraft, LearningSession};
use chrono::{DateTime, FixedOffset, Utc};
use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Result wrapper for FFI responses.
#[derive(serde::Serialize)]
#[serde(untagged)]
enum FfiResult<T: serde::Serialize> {
    Ok { ok: T },
    Err { error: String },
}

impl<T: serde::Serialize> FfiResult<T> {
    fn ok(value: T) -> Self {
        FfiResult::Ok { ok: value }
    }

    fn err(message: impl Into<String>) -> Self {
        FfiResult::Err {
            error: message.into(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `lingo_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => CString::new(r#"{"error":"string contained null bytes"}"#)
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut()),
    }
}

fn error_string(message: impl Into<String>) -> *mut c_char {
    to_c_string(FfiResult::<()>::err(message).to_json())
}

/// Convert a C string pointer to a Rust string.
/// Returns None if pointer is null or invalid UTF-8.
unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

// ============================================================================
// Store Lifecycle
// ============================================================================

/// Create an empty store.
///
/// # Returns
/// Pointer to GuestStore, or null if `created_at_ms` is out of range.
///
/// # Safety
/// - Caller must free the returned pointer with `lingo_store_free`
#[no_mangle]
pub extern "C" fn lingo_store_new(created_at_ms: i64) -> *mut GuestStore {
    match from_millis(created_at_ms) {
        Some(created_at) => Box::into_raw(Box::new(GuestStore::new(created_at))),
        None => ptr::null_mut(),
    }
}

/// Create a store from a snapshot.
///
/// # Returns
/// Pointer to GuestStore, or null on invalid input.
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string or null
/// - Caller must free the returned pointer with `lingo_store_free`
#[no_mangle]
pub unsafe extern "C" fn lingo_store_from_snapshot(snapshot_json: *const c_char) -> *mut GuestStore {
    let Some(json) = from_c_string(snapshot_json) else {
        return ptr::null_mut();
    };

    match GuestSnapshot::from_json(&json).and_then(GuestStore::from_snapshot) {
        Ok(store) => Box::into_raw(Box::new(store)),
        Err(_) => ptr::null_mut(),
    }
}

/// Free a store.
///
/// # Safety
/// - `store` must be a valid pointer from `lingo_store_new` or
///   `lingo_store_from_snapshot`
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn lingo_store_free(store: *mut GuestStore) {
    if !store.is_null() {
        drop(Box::from_raw(store));
    }
}

/// Free a string allocated by the engine.
///
/// # Safety
/// - `s` must be a valid pointer from a `lingo_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn lingo_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Knowledge Points
// ============================================================================

/// Save a guest knowledge point.
///
/// # Arguments
/// - `draft_json`: free-form record JSON; must carry a string `id`
///
/// # Returns
/// JSON string: `{"ok": LocalKnowledgePoint}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid store pointer or null
/// - `draft_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `lingo_string_free`
#[no_mangle]
pub unsafe extern "C" fn lingo_store_save_point(
    store: *mut GuestStore,
    draft_json: *const c_char,
) -> *mut c_char {
    let Some(store) = store.as_mut() else {
        return error_string("null store pointer");
    };
    let Some(json) = from_c_string(draft_json) else {
        return error_string("invalid draft JSON");
    };

    let value: serde_json::Value = match serde_json::from_str(&json) {
        Ok(v) => v,
        Err(e) => return error_string(format!("parse error: {}", e)),
    };

    match KnowledgePointDraft::from_value(value) {
        Ok(draft) => to_c_string(FfiResult::ok(store.save_local_knowledge_point(draft)).to_json()),
        Err(e) => error_string(e.to_string()),
    }
}

/// List all local knowledge points.
///
/// # Returns
/// JSON string: `{"ok": [LocalKnowledgePoint]}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid store pointer or null
/// - Caller must free the returned string with `lingo_string_free`
#[no_mangle]
pub unsafe extern "C" fn lingo_store_points(store: *const GuestStore) -> *mut c_char {
    let Some(store) = store.as_ref() else {
        return error_string("null store pointer");
    };
    to_c_string(FfiResult::ok(store.local_knowledge_points()).to_json())
}

/// Get count of records waiting to be synced.
///
/// # Safety
/// - `store` must be a valid store pointer or null
#[no_mangle]
pub unsafe extern "C" fn lingo_store_pending_count(store: *const GuestStore) -> i64 {
    match store.as_ref() {
        Some(s) => s.pending_count() as i64,
        None => -1,
    }
}

/// Remove a synced record by its negative id.
///
/// # Returns
/// JSON string: `{"ok": LocalKnowledgePoint}`, `{"ok": null}` if absent,
/// or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid store pointer or null
/// - Caller must free the returned string with `lingo_string_free`
#[no_mangle]
pub unsafe extern "C" fn lingo_store_remove_local(store: *mut GuestStore, id: i64) -> *mut c_char {
    let Some(store) = store.as_mut() else {
        return error_string("null store pointer");
    };
    to_c_string(FfiResult::ok(store.remove_local(id)).to_json())
}

/// Run the legacy record migration.
///
/// # Returns
/// JSON string: `{"ok": MigrationReport}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid store pointer or null
/// - Caller must free the returned string with `lingo_string_free`
#[no_mangle]
pub unsafe extern "C" fn lingo_store_migrate(store: *mut GuestStore) -> *mut c_char {
    let Some(store) = store.as_mut() else {
        return error_string("null store pointer");
    };
    to_c_string(FfiResult::ok(store.migrate_legacy_records()).to_json())
}

// ============================================================================
// Sessions & Profile
// ============================================================================

/// Append a learning session.
///
/// # Arguments
/// - `session_json`: object with an ISO-8601 `timestamp` plus any payload
///
/// # Returns
/// JSON string: `{"ok": null}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid store pointer or null
/// - `session_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `lingo_string_free`
#[no_mangle]
pub unsafe extern "C" fn lingo_store_save_session(
    store: *mut GuestStore,
    session_json: *const c_char,
) -> *mut c_char {
    let Some(store) = store.as_mut() else {
        return error_string("null store pointer");
    };
    let Some(json) = from_c_string(session_json) else {
        return error_string("invalid session JSON");
    };

    match serde_json::from_str::<LearningSession>(&json) {
        Ok(session) => {
            store.save_learning_session(session);
            to_c_string(FfiResult::ok(()).to_json())
        }
        Err(e) => error_string(format!("parse error: {}", e)),
    }
}

/// Record learning progress: add seconds and optionally count a completed
/// session.
///
/// # Returns
/// `0` on success, `-1` for a null store.
///
/// # Safety
/// - `store` must be a valid store pointer or null
#[no_mangle]
pub unsafe extern "C" fn lingo_store_record_progress(
    store: *mut GuestStore,
    seconds: u64,
    session_completed: bool,
) -> i32 {
    let Some(store) = store.as_mut() else {
        return -1;
    };
    store.add_learning_time(seconds);
    if session_completed {
        store.complete_session();
    }
    0
}

/// Check whether a guest feature is available.
///
/// # Arguments
/// - `feature`: snake_case feature name, e.g. `"daily_practice"`
/// - `now_ms`: current time
/// - `utc_offset_secs`: device timezone offset, used to decide "today"
///
/// # Returns
/// `1` if available, `0` if not, `-1` for invalid arguments.
///
/// # Safety
/// - `store` must be a valid store pointer or null
/// - `feature` must be a valid null-terminated C string or null
#[no_mangle]
pub unsafe extern "C" fn lingo_store_can_use_feature(
    store: *const GuestStore,
    feature: *const c_char,
    now_ms: i64,
    utc_offset_secs: i32,
) -> i32 {
    let Some(store) = store.as_ref() else {
        return -1;
    };
    let Some(name) = from_c_string(feature) else {
        return -1;
    };
    let Ok(feature) = serde_json::from_value::<GuestFeature>(serde_json::Value::String(name))
    else {
        return -1;
    };
    let (Some(now), Some(offset)) = (from_millis(now_ms), FixedOffset::east_opt(utc_offset_secs))
    else {
        return -1;
    };

    store.can_use_feature(feature, &now.with_timezone(&offset)) as i32
}

/// Check whether the registration prompt should be shown.
///
/// # Returns
/// `1` or `0`, `-1` for a null store.
///
/// # Safety
/// - `store` must be a valid store pointer or null
#[no_mangle]
pub unsafe extern "C" fn lingo_store_should_prompt_registration(store: *const GuestStore) -> i32 {
    match store.as_ref() {
        Some(s) => s.should_show_registration_prompt() as i32,
        None => -1,
    }
}

/// Clear all guest data. The id counter is kept.
///
/// # Returns
/// `0` on success, `-1` for invalid arguments.
///
/// # Safety
/// - `store` must be a valid store pointer or null
#[no_mangle]
pub unsafe extern "C" fn lingo_store_clear(store: *mut GuestStore, now_ms: i64) -> i32 {
    let (Some(store), Some(now)) = (store.as_mut(), from_millis(now_ms)) else {
        return -1;
    };
    store.clear_guest_data(now);
    0
}

// ============================================================================
// Persistence
// ============================================================================

/// Export store state as a snapshot.
///
/// # Returns
/// JSON string: `{"ok": GuestSnapshot}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid store pointer or null
/// - Caller must free the returned string with `lingo_string_free`
#[no_mangle]
pub unsafe extern "C" fn lingo_store_export(store: *const GuestStore) -> *mut c_char {
    let Some(store) = store.as_ref() else {
        return error_string("null store pointer");
    };
    to_c_string(FfiResult::ok(store.export_state()).to_json())
}

/// Import state from a snapshot.
///
/// # Returns
/// JSON string: `{"ok": null}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid store pointer or null
/// - `snapshot_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `lingo_string_free`
#[no_mangle]
pub unsafe extern "C" fn lingo_store_import(
    store: *mut GuestStore,
    snapshot_json: *const c_char,
) -> *mut c_char {
    let Some(store) = store.as_mut() else {
        return error_string("null store pointer");
    };
    let Some(json) = from_c_string(snapshot_json) else {
        return error_string("invalid snapshot JSON");
    };

    match GuestSnapshot::from_json(&json).and_then(|s| store.import_state(s)) {
        Ok(()) => to_c_string(FfiResult::ok(()).to_json()),
        Err(e) => error_string(e.to_string()),
    }
}

/// Get snapshot metadata without full export.
///
/// # Returns
/// JSON string: `{"ok": SnapshotMetadata}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid store pointer or null
/// - Caller must free the returned string with `lingo_string_free`
#[no_mangle]
pub unsafe extern "C" fn lingo_store_metadata(store: *const GuestStore) -> *mut c_char {
    let Some(store) = store.as_ref() else {
        return error_string("null store pointer");
    };
    to_c_string(FfiResult::ok(store.export_state().metadata()).to_json())
}

// ============================================================================
// Utility
// ============================================================================

/// Get the engine version.
///
/// # Returns
/// Static string pointer (do not free)
#[no_mangle]
pub extern "C" fn lingo_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

/// Get the snapshot format version.
#[no_mangle]
pub extern "C" fn lingo_snapshot_format_version() -> u32 {
    crate::SNAPSHOT_FORMAT_VERSION
}
