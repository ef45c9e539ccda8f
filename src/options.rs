//! Registry of application option callbacks.
//!
//! Embedders register a handler per option code; incoming replies dispatch
//! matching option values to it, truncated to the registered maximum length.
//! The registry also derives the parameter-request list sent in DISCOVER
//! messages from the built-in minimum set plus every registered code.

use std::collections::BTreeMap;

use crate::wire::{OPT_DNS, OPT_ROUTER, OPT_SUBNET_MASK};

/// Codes always requested from the server, handled by the core itself.
pub const BASE_REQUEST_OPTIONS: [u8; 3] = [OPT_SUBNET_MASK, OPT_ROUTER, OPT_DNS];

/// Hard cap on the parameter-request list length.
pub const MAX_REQUESTED_OPTIONS: usize = 8;

/// Callback invoked for a registered option code found in a server reply.
pub trait OptionHandler {
    fn handle(&mut self, ifindex: u32, code: u8, data: &[u8]);
}

impl<F: FnMut(u32, u8, &[u8])> OptionHandler for F {
    fn handle(&mut self, ifindex: u32, code: u8, data: &[u8]) {
        self(ifindex, code, data)
    }
}

struct Registered {
    max_len: usize,
    handler: Box<dyn OptionHandler>,
}

/// Option callbacks keyed by code, plus the derived request list.
pub struct OptionRegistry {
    callbacks: BTreeMap<u8, Registered>,
    request_list: Vec<u8>,
}

impl Default for OptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self {
            callbacks: BTreeMap::new(),
            request_list: BASE_REQUEST_OPTIONS.to_vec(),
        }
    }

    /// Register a handler for `code`, replacing any previous one. Values
    /// longer than `max_len` are truncated before dispatch.
    pub fn add(&mut self, code: u8, max_len: usize, handler: Box<dyn OptionHandler>) {
        self.callbacks.insert(code, Registered { max_len, handler });
        self.rebuild_request_list();
    }

    /// Drop the handler for `code`, if any.
    pub fn remove(&mut self, code: u8) {
        self.callbacks.remove(&code);
        self.rebuild_request_list();
    }

    /// Codes to place in the parameter-request-list option.
    pub fn request_list(&self) -> &[u8] {
        &self.request_list
    }

    /// Invoke the handler registered for `code`, if any. Returns whether a
    /// handler consumed the value.
    pub fn dispatch(&mut self, ifindex: u32, code: u8, data: &[u8]) -> bool {
        match self.callbacks.get_mut(&code) {
            Some(registered) => {
                let len = data.len().min(registered.max_len);
                registered.handler.handle(ifindex, code, &data[..len]);
                true
            }
            None => false,
        }
    }

    fn rebuild_request_list(&mut self) {
        self.request_list.clear();
        self.request_list.extend_from_slice(&BASE_REQUEST_OPTIONS);
        for &code in self.callbacks.keys() {
            if self.request_list.contains(&code) {
                continue;
            }
            if self.request_list.len() >= MAX_REQUESTED_OPTIONS {
                log::warn!("parameter request list full, not requesting option {code}");
                continue;
            }
            self.request_list.push(code);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_base_request_list() {
        let registry = OptionRegistry::new();
        assert_eq!(registry.request_list(), &[1, 3, 6]);
    }

    #[test]
    fn test_add_remove_rebuilds_list() {
        let mut registry = OptionRegistry::new();
        registry.add(42, 64, Box::new(|_, _, _: &[u8]| {}));
        assert_eq!(registry.request_list(), &[1, 3, 6, 42]);

        // Re-adding the same code does not duplicate it.
        registry.add(42, 32, Box::new(|_, _, _: &[u8]| {}));
        assert_eq!(registry.request_list(), &[1, 3, 6, 42]);

        registry.remove(42);
        assert_eq!(registry.request_list(), &[1, 3, 6]);
        registry.remove(42);
        assert_eq!(registry.request_list(), &[1, 3, 6]);
    }

    #[test]
    fn test_builtin_code_not_duplicated() {
        let mut registry = OptionRegistry::new();
        registry.add(OPT_ROUTER, 64, Box::new(|_, _, _: &[u8]| {}));
        assert_eq!(registry.request_list(), &[1, 3, 6]);
    }

    #[test]
    fn test_request_list_capped() {
        let mut registry = OptionRegistry::new();
        for code in 100..110u8 {
            registry.add(code, 16, Box::new(|_, _, _: &[u8]| {}));
        }
        assert_eq!(registry.request_list().len(), MAX_REQUESTED_OPTIONS);
        assert_eq!(registry.request_list(), &[1, 3, 6, 100, 101, 102, 103, 104]);

        // Removing a requested code lets the next-lowest dropped one in.
        registry.remove(100);
        assert_eq!(registry.request_list(), &[1, 3, 6, 101, 102, 103, 104, 105]);
    }

    #[test]
    fn test_dispatch_truncates_to_max_len() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut registry = OptionRegistry::new();
        registry.add(
            42,
            4,
            Box::new(move |ifindex, code, data: &[u8]| {
                sink.borrow_mut().push((ifindex, code, data.to_vec()));
            }),
        );

        assert!(registry.dispatch(7, 42, &[1, 2, 3, 4, 5, 6]));
        assert!(!registry.dispatch(7, 43, &[1]));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (7, 42, vec![1, 2, 3, 4]));
    }
}
