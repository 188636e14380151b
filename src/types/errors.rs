use std::fmt;

use super::metrics::ObserverKind;
use super::tab::TabId;

// === MessagingError ===

/// Failures of a best-effort runtime message round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagingError {
    /// Nothing in the target context is listening.
    NoReceiver,
    /// The channel closed before a reply arrived.
    ChannelClosed(String),
    /// No reply within the given number of milliseconds.
    Timeout(u64),
    /// The counterparty answered with something unreadable.
    InvalidReply(String),
}

impl fmt::Display for MessagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessagingError::NoReceiver => write!(f, "No receiving end for message"),
            MessagingError::ChannelClosed(msg) => write!(f, "Message channel closed: {}", msg),
            MessagingError::Timeout(ms) => write!(f, "No reply within {}ms", ms),
            MessagingError::InvalidReply(msg) => write!(f, "Invalid reply: {}", msg),
        }
    }
}

impl std::error::Error for MessagingError {}

// === InjectionError ===

/// Errors installing the instrumentation payload into a page.
#[derive(Debug, Clone, PartialEq)]
pub enum InjectionError {
    /// The host refused access to the page.
    PermissionDenied(String),
    /// The tab is gone or cannot be scripted.
    InvalidTarget(String),
    /// Any other injection failure.
    Failed(String),
}

impl fmt::Display for InjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectionError::PermissionDenied(msg) => {
                write!(f, "Injection permission denied: {}", msg)
            }
            InjectionError::InvalidTarget(msg) => write!(f, "Invalid injection target: {}", msg),
            InjectionError::Failed(msg) => write!(f, "Injection failed: {}", msg),
        }
    }
}

impl std::error::Error for InjectionError {}

// === ToggleError ===

/// Errors surfaced to the caller of a toggle.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleError {
    /// Another toggle for this tab has not settled yet.
    InFlight(TabId),
    /// Installing the instrumentation failed; the tab is left uninstrumented.
    Injection(InjectionError),
}

impl fmt::Display for ToggleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleError::InFlight(tab) => write!(f, "Toggle already in flight for tab {}", tab),
            ToggleError::Injection(err) => write!(f, "Toggle aborted: {}", err),
        }
    }
}

impl std::error::Error for ToggleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToggleError::Injection(err) => Some(err),
            ToggleError::InFlight(_) => None,
        }
    }
}

impl From<InjectionError> for ToggleError {
    fn from(err: InjectionError) -> Self {
        ToggleError::Injection(err)
    }
}

// === EntitlementError ===

/// Errors querying the external entitlement service.
#[derive(Debug, Clone, PartialEq)]
pub enum EntitlementError {
    /// The service could not be reached or answered with an error.
    Unavailable(String),
}

impl fmt::Display for EntitlementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntitlementError::Unavailable(msg) => {
                write!(f, "Entitlement service unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for EntitlementError {}

// === ObserverError ===

/// Errors registering a platform performance observer.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverError {
    /// The platform does not report this entry type.
    Unsupported(ObserverKind),
}

impl fmt::Display for ObserverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObserverError::Unsupported(kind) => {
                write!(f, "Unsupported observer: {}", kind.entry_type())
            }
        }
    }
}

impl std::error::Error for ObserverError {}

// === StoreError ===

/// Errors reading or writing page-scoped local storage.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// An I/O error occurred on the backing file.
    Io(String),
    /// The backing data could not be (de)serialized.
    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "Local store I/O error: {}", msg),
            StoreError::Serialization(msg) => {
                write!(f, "Local store serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StoreError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
