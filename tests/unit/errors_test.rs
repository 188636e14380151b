use std::error::Error;

use devpulse::types::errors::*;
use devpulse::types::metrics::ObserverKind;

// === MessagingError Tests ===

#[test]
fn messaging_error_display_variants() {
    assert_eq!(MessagingError::NoReceiver.to_string(), "No receiving end for message");
    assert_eq!(
        MessagingError::ChannelClosed("port closed".to_string()).to_string(),
        "Message channel closed: port closed"
    );
    assert_eq!(MessagingError::Timeout(500).to_string(), "No reply within 500ms");
    assert_eq!(
        MessagingError::InvalidReply("expected object".to_string()).to_string(),
        "Invalid reply: expected object"
    );
}

#[test]
fn messaging_error_implements_error_trait() {
    let err: Box<dyn Error> = Box::new(MessagingError::NoReceiver);
    assert!(err.source().is_none());
}

// === InjectionError Tests ===

#[test]
fn injection_error_display_variants() {
    assert_eq!(
        InjectionError::PermissionDenied("chrome://newtab".to_string()).to_string(),
        "Injection permission denied: chrome://newtab"
    );
    assert_eq!(
        InjectionError::InvalidTarget("tab 9".to_string()).to_string(),
        "Invalid injection target: tab 9"
    );
    assert_eq!(
        InjectionError::Failed("script error".to_string()).to_string(),
        "Injection failed: script error"
    );
}

// === ToggleError Tests ===

#[test]
fn toggle_error_in_flight_display() {
    let err = ToggleError::InFlight(12);
    assert_eq!(err.to_string(), "Toggle already in flight for tab 12");
    assert!(err.source().is_none());
}

#[test]
fn toggle_error_wraps_injection_error() {
    let err: ToggleError = InjectionError::PermissionDenied("file://".to_string()).into();

    assert_eq!(
        err.to_string(),
        "Toggle aborted: Injection permission denied: file://"
    );
    let source = err.source().expect("injection failure should be the source");
    assert_eq!(source.to_string(), "Injection permission denied: file://");
}

// === EntitlementError / ObserverError Tests ===

#[test]
fn entitlement_error_display() {
    let err = EntitlementError::Unavailable("offline".to_string());
    assert_eq!(err.to_string(), "Entitlement service unavailable: offline");
}

#[test]
fn observer_error_names_entry_type() {
    let err = ObserverError::Unsupported(ObserverKind::LongTask);
    assert_eq!(err.to_string(), "Unsupported observer: longtask");
}

// === StoreError / SettingsError Tests ===

#[test]
fn store_error_display_variants() {
    assert_eq!(
        StoreError::Io("disk full".to_string()).to_string(),
        "Local store I/O error: disk full"
    );
    assert_eq!(
        StoreError::Serialization("trailing comma".to_string()).to_string(),
        "Local store serialization error: trailing comma"
    );
}

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("denied".to_string()).to_string(),
        "Settings I/O error: denied"
    );
    assert_eq!(
        SettingsError::SerializationError("eof".to_string()).to_string(),
        "Settings serialization error: eof"
    );
    assert_eq!(
        SettingsError::InvalidKey("a.b".to_string()).to_string(),
        "Invalid settings key: a.b"
    );
    assert_eq!(
        SettingsError::InvalidValue("not a number".to_string()).to_string(),
        "Invalid settings value: not a number"
    );
}

#[test]
fn all_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync + Error>() {}
    assert_send_sync::<MessagingError>();
    assert_send_sync::<InjectionError>();
    assert_send_sync::<ToggleError>();
    assert_send_sync::<EntitlementError>();
    assert_send_sync::<ObserverError>();
    assert_send_sync::<StoreError>();
    assert_send_sync::<SettingsError>();
}
