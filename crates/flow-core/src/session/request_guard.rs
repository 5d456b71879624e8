use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use log::debug;

use crate::segment::Section;

/// Identity of one segmentation request: which section, which text, which
/// chunking.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RequestKey {
    pub section_index: usize,
    pub text_hash: u64,
    pub words_per_chunk: usize,
}

impl RequestKey {
    pub fn new(section: &Section, words_per_chunk: usize) -> Self {
        let mut hasher = DefaultHasher::new();
        section.text.hash(&mut hasher);
        Self {
            section_index: section.index,
            text_hash: hasher.finish(),
            words_per_chunk,
        }
    }
}

/// Remembers the last submitted request so identical resubmissions are
/// skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubmissionGuard {
    last: Option<RequestKey>,
}

impl SubmissionGuard {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Records `key` and returns `true` unless it equals the last one.
    pub fn should_submit(&mut self, key: RequestKey) -> bool {
        if self.last == Some(key) {
            debug!(
                "session: skip duplicate segmentation request for section {}",
                key.section_index
            );
            return false;
        }
        self.last = Some(key);
        true
    }

    /// Forgets the last request, e.g. after the model call failed.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<RequestKey> {
        self.last
    }
}
