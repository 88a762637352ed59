//! Pairing state machine
//!
//! Tracks one object-role and one address-role barcode at a time. The moment
//! both are held, the pair is emitted for persistence and the machine resets,
//! then refuses to complete again for a cooldown window so a label still in
//! front of the camera cannot re-pair immediately.
//!
//! Pairing consumes barcode payloads only. OCR-derived text detections are a
//! display/debug signal and are not accepted here.

use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Prefix tag marking an object-role barcode payload
pub const OBJECT_TAG: &str = "OBJ;";
/// Prefix tag marking an address-role barcode payload
pub const ADDRESS_TAG: &str = "APT;";

/// Role of a barcode payload, classified by its prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Object,
    Address,
    Unknown,
}

impl Role {
    /// Classify a payload by its prefix tag, case-insensitively
    pub fn classify(payload: &str) -> Self {
        if has_tag(payload, OBJECT_TAG) {
            Role::Object
        } else if has_tag(payload, ADDRESS_TAG) {
            Role::Address
        } else {
            Role::Unknown
        }
    }
}

fn has_tag(payload: &str, tag: &str) -> bool {
    payload
        .get(..tag.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(tag))
}

/// An object/address pair ready for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPair {
    /// Full object-role payload, tag included
    pub object: String,
    /// Full address-role payload, tag included
    pub address: String,
}

/// Pairing configuration
#[derive(Debug, Clone)]
pub struct PairingConfig {
    /// How long after a completed pair the completion check stays suspended
    pub cooldown: Duration,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(3000),
        }
    }
}

/// The pairing state machine.
///
/// Owned exclusively by the extraction thread; never shared.
#[derive(Debug)]
pub struct Pairing {
    object: Option<String>,
    address: Option<String>,
    cooldown: Duration,
    cooldown_until: Option<Instant>,
}

impl Pairing {
    pub fn new(config: PairingConfig) -> Self {
        Self {
            object: None,
            address: None,
            cooldown: config.cooldown,
            cooldown_until: None,
        }
    }

    /// Fold one extraction cycle's barcode payloads into the machine and run
    /// the completion check.
    ///
    /// A payload updates the held code of its role only if it differs from
    /// the value already held; re-observing the identical code is silently
    /// ignored. Unknown prefixes neither populate nor clear anything.
    ///
    /// Returns the completed pair when both roles are held and the cooldown
    /// window is not active. Emission clears both held codes synchronously
    /// and arms the cooldown, so at most one pair per simultaneous hold.
    pub fn apply_cycle<'a, I>(&mut self, payloads: I, now: Instant) -> Option<CompletedPair>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for payload in payloads {
            match Role::classify(payload) {
                Role::Object => Self::hold(&mut self.object, payload, "object"),
                Role::Address => Self::hold(&mut self.address, payload, "address"),
                Role::Unknown => debug!("ignoring barcode with unknown prefix: {}", payload),
            }
        }

        if self.in_cooldown(now) {
            return None;
        }

        match (self.object.take(), self.address.take()) {
            (Some(object), Some(address)) => {
                self.cooldown_until = Some(now + self.cooldown);
                Some(CompletedPair { object, address })
            }
            (object, address) => {
                self.object = object;
                self.address = address;
                None
            }
        }
    }

    fn hold(slot: &mut Option<String>, payload: &str, role: &str) {
        if slot.as_deref() == Some(payload) {
            return;
        }
        info!("{} code held: {}", role, payload);
        *slot = Some(payload.to_string());
    }

    /// Held object code, if any
    pub fn held_object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    /// Held address code, if any
    pub fn held_address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Whether the completion check is suspended at `now`
    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }
}
