//! Voice Domain
//!
//! In-memory representation of FM voices, shared by the SysEx codec and the
//! text readers/writers.
//!
//! A [`Voice`] is a name plus a string-keyed parameter map. Keys follow the
//! naming scheme of [`fields`]: bare `ALGO`/`LFOR`/`LPMD`, `OPn.FIELD` for
//! operators, `ALL.FIELD` for globals, and `XXnn` placeholders for reserved
//! bits of the packed layout.

pub mod fields;

use std::collections::BTreeMap;

/// Parameter map of a voice
pub type VoiceParams = BTreeMap<String, u8>;

/// One FM voice: name plus parameter bytes
///
/// Voices are immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Voice {
    name: String,
    params: VoiceParams,
}

impl Voice {
    /// Create a voice from a name and a parameter map
    pub fn new(name: impl Into<String>, params: VoiceParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Voice name, exactly as decoded or read (no trimming)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All parameters
    pub fn params(&self) -> &VoiceParams {
        &self.params
    }

    /// Value of a parameter, if present
    pub fn get(&self, key: &str) -> Option<u8> {
        self.params.get(key).copied()
    }

    /// Value of a parameter, or 0 when absent
    pub fn param(&self, key: &str) -> u8 {
        self.get(key).unwrap_or(0)
    }

    /// Check whether every key in `keys` is present
    pub fn has_keys<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().all(|k| self.params.contains_key(k.as_ref()))
    }
}

/// Ordered collection of voices for one conversion
///
/// Populated once by a reader and consumed once by a writer. Readers append
/// only after a whole input has been parsed, so a failed read leaves the
/// store as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceStore {
    voices: Vec<Voice>,
}

impl VoiceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one voice
    pub fn push(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    /// Number of voices
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// True if no voices are stored
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Voice at `index`
    pub fn get(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    /// Iterate voices in order
    pub fn iter(&self) -> std::slice::Iter<'_, Voice> {
        self.voices.iter()
    }

    /// Voices as a slice
    pub fn as_slice(&self) -> &[Voice] {
        &self.voices
    }
}

impl Extend<Voice> for VoiceStore {
    fn extend<I: IntoIterator<Item = Voice>>(&mut self, iter: I) {
        self.voices.extend(iter);
    }
}

impl FromIterator<Voice> for VoiceStore {
    fn from_iter<I: IntoIterator<Item = Voice>>(iter: I) -> Self {
        Self {
            voices: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Voice>> for VoiceStore {
    fn from(voices: Vec<Voice>) -> Self {
        Self { voices }
    }
}

impl<'a> IntoIterator for &'a VoiceStore {
    type Item = &'a Voice;
    type IntoIter = std::slice::Iter<'a, Voice>;

    fn into_iter(self) -> Self::IntoIter {
        self.voices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, algo: u8) -> Voice {
        let mut params = VoiceParams::new();
        params.insert("ALGO".to_string(), algo);
        Voice::new(name, params)
    }

    #[test]
    fn test_voice_accessors() {
        let v = voice("BRASS 1   ", 21);
        assert_eq!(v.name(), "BRASS 1   ");
        assert_eq!(v.get("ALGO"), Some(21));
        assert_eq!(v.get("LFOR"), None);
        assert_eq!(v.param("LFOR"), 0);
        assert!(v.has_keys(&["ALGO"]));
        assert!(!v.has_keys(&["ALGO", "LFOR"]));
    }

    #[test]
    fn test_store_preserves_order() {
        let mut store = VoiceStore::new();
        store.push(voice("A", 1));
        store.extend(vec![voice("B", 2), voice("C", 3)]);
        let names: Vec<&str> = store.iter().map(Voice::name).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1).map(|v| v.param("ALGO")), Some(2));
    }

    #[test]
    fn test_store_from_iterator() {
        let store: VoiceStore = (0..4).map(|i| voice("X", i)).collect();
        assert_eq!(store.len(), 4);
        assert!(!store.is_empty());
        assert_eq!(store.as_slice()[3].param("ALGO"), 3);
    }
}
