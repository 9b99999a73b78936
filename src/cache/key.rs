//! Cache Key Module
//!
//! Derives deterministic cache keys from a method name, the owning
//! repository's identity and the declared subset of the method's arguments.
//! One backend instance is commonly shared by several repositories; the
//! owner component keeps their keys from colliding.
//!
//! Keys are the components joined with a fixed delimiter. Missing optional
//! arguments render as a sentinel token, and unordered collections are
//! sorted before joining so that semantically identical calls always land on
//! the same key. Two distinct argument tuples could still collide if an
//! argument value itself contains the delimiter; that is an accepted
//! limitation of the readable key scheme, not a guarantee this module makes.

use std::fmt::Display;

// == Key Constants ==
/// Delimiter between key components.
pub const KEY_SEPARATOR: char = '|';

/// Token rendered for a missing optional argument.
pub const NONE_TOKEN: &str = "None";

/// Delimiter between the elements of one collection-valued argument.
const LIST_SEPARATOR: char = ',';

// == Cache Key Builder ==
/// Builder for cache keys.
///
/// The first two components are always the method name and the owner
/// identifier, followed by one component per declared argument in
/// declaration order.
#[derive(Debug, Clone)]
pub struct CacheKey {
    parts: Vec<String>,
}

impl CacheKey {
    // == Constructor ==
    /// Starts a key for `method` on the owner identified by `owner`.
    pub fn new(method: &str, owner: &str) -> Self {
        Self {
            parts: vec![method.to_string(), owner.to_string()],
        }
    }

    // == Arg ==
    /// Appends a required argument value.
    pub fn arg<T: Display>(mut self, value: T) -> Self {
        self.parts.push(value.to_string());
        self
    }

    // == Opt ==
    /// Appends an optional argument value, rendering `None` as the sentinel.
    pub fn opt<T: Display>(mut self, value: Option<T>) -> Self {
        match value {
            Some(v) => self.parts.push(v.to_string()),
            None => self.parts.push(NONE_TOKEN.to_string()),
        }
        self
    }

    // == Sorted List ==
    /// Appends a collection-valued argument, sorted so that differently
    /// ordered but semantically identical inputs produce the same key.
    pub fn sorted_list<S: AsRef<str>>(mut self, values: Option<&[S]>) -> Self {
        match values {
            Some(items) => {
                let mut sorted: Vec<&str> = items.iter().map(|s| s.as_ref()).collect();
                sorted.sort_unstable();
                self.parts
                    .push(sorted.join(&LIST_SEPARATOR.to_string()));
            }
            None => self.parts.push(NONE_TOKEN.to_string()),
        }
        self
    }

    // == Build ==
    /// Joins the components into the final key string.
    pub fn build(self) -> String {
        let sep = KEY_SEPARATOR.to_string();
        self.parts.join(&sep)
    }
}

// == Component Accessors ==
/// Returns the method-name component of a built key.
pub fn method_component(key: &str) -> Option<&str> {
    key.split(KEY_SEPARATOR).next()
}

/// Returns the owner component of a built key.
pub fn owner_component(key: &str) -> Option<&str> {
    key.split(KEY_SEPARATOR).nth(1)
}

/// Returns true when `key` belongs to `owner`.
pub fn is_owned_by(key: &str, owner: &str) -> bool {
    owner_component(key) == Some(owner)
}
