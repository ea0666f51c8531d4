//! Streaming search for a multipart delimiter.
//!
//! A Knuth-Morris-Pratt automaton: the failure table is built once per
//! pattern, then bytes are fed one at a time with no look-ahead and no
//! rescanning, so a body of any length is searched in linear time without
//! being held in memory.

/// Incremental matcher for one fixed pattern.
///
/// `state` is always the length of the longest prefix of the pattern that is
/// a suffix of everything fed so far. When it reaches the pattern length a
/// match is reported and the automaton starts over from zero.
#[derive(Debug, Clone)]
pub struct BoundaryScanner {
    pattern: Vec<u8>,
    failure: Vec<usize>,
    state: usize,
}

impl BoundaryScanner {
    /// # Panics
    ///
    /// Panics if `pattern` is empty.
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        let pattern = pattern.into();
        assert!(!pattern.is_empty(), "boundary pattern must not be empty");
        let failure = failure_function(&pattern);

        Self {
            pattern,
            failure,
            state: 0,
        }
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    pub fn state(&self) -> usize {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0;
    }

    /// Advances over one byte. Returns true when this byte completes the
    /// pattern; the state is then back at zero.
    pub fn feed(&mut self, byte: u8) -> bool {
        while self.state > 0 && self.pattern[self.state] != byte {
            self.state = self.failure[self.state - 1];
        }
        if self.pattern[self.state] == byte {
            self.state += 1;
        }

        if self.state == self.pattern.len() {
            self.state = 0;
            return true;
        }
        false
    }

    /// Feeds bytes until a match completes, returning the number of bytes
    /// consumed (the match ends at that offset). `None` means every byte was
    /// consumed without completing a match.
    pub fn find(&mut self, chunk: &[u8]) -> Option<usize> {
        chunk
            .iter()
            .position(|&b| self.feed(b))
            .map(|i| i + 1)
    }
}

/// `failure[i]`: length of the longest proper prefix of `pattern[..=i]` that
/// is also a suffix of it.
fn failure_function(pattern: &[u8]) -> Vec<usize> {
    let mut failure = vec![0; pattern.len()];
    let mut k = 0;

    for i in 1..pattern.len() {
        while k > 0 && pattern[i] != pattern[k] {
            k = failure[k - 1];
        }
        if pattern[i] == pattern[k] {
            k += 1;
        }
        failure[i] = k;
    }

    failure
}
