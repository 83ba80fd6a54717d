//! Identity collaborator.
//!
//! Saved files carry a footer naming who last edited them. The store itself
//! has no notion of sessions or users; callers plug in whatever identity
//! source the surrounding system has.

/// Supplies a display name for the currently acting principal.
pub trait Identity {
    /// The display name, or `None` when nobody is acting.
    fn display_name(&self) -> Option<String>;
}

/// Default identity provider: nobody is acting.
///
/// The saver footer falls back to `"Unknown"`.
pub struct Anonymous;

impl Identity for Anonymous {
    fn display_name(&self) -> Option<String> {
        None
    }
}

/// Fixed display name, for callers with a single known principal.
pub struct NamedIdentity(pub String);

impl Identity for NamedIdentity {
    fn display_name(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
