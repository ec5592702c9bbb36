// Copyright (c) 2025 - Cowboy AI, Inc.
//! Observable capability
//!
//! Objects that announce changes to named properties. The announcement carries
//! only the property name; observers read the new value back from the object.

use super::event::Event;

/// An object exposing a "property changed" channel keyed by property name
pub trait Observable: Send + Sync {
    /// Channel that fires with the name of each property that changed
    fn property_changed_event(&self) -> &Event<String>;

    /// Announce that `name` changed
    fn notify_property_changed(&self, name: &str) {
        self.property_changed_event().fire(&name.to_string());
    }
}
