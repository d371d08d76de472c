//! Events and the listen-word encoding
//!
//! An event waiter stores the (id, value) pair it listens for packed into
//! the fiber's 32-bit context slot. Zero in either half is a wildcard.

/// Wildcard: match events from any source.
pub const ID_ANY: u16 = 0;

/// Wildcard: match any event value.
pub const VALUE_ANY: u16 = 0;

/// An event delivered by the message bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Originating component id.
    pub source: u16,
    /// Event value within that source.
    pub value: u16,
}

impl Event {
    #[inline]
    pub const fn new(source: u16, value: u16) -> Event {
        Event { source, value }
    }
}

/// Pack an (id, value) listen pair into a context word: value in the high
/// half, id in the low half.
#[inline]
pub const fn pack_listen(id: u16, value: u16) -> u32 {
    (value as u32) << 16 | id as u32
}

/// Decode a context word back into its (id, value) listen pair.
#[inline]
pub const fn unpack_listen(context: u32) -> (u16, u16) {
    ((context & 0xFFFF) as u16, (context >> 16) as u16)
}

/// Event match rule: the waiter wakes iff its id is ANY or equals the
/// event source, and its value is ANY or equals the event value.
#[inline]
pub fn matches(context: u32, event: Event) -> bool {
    let (id, value) = unpack_listen(context);
    (id == ID_ANY || id == event.source) && (value == VALUE_ANY || value == event.value)
}
