//! Named float parameters with case-insensitive keys.

/// Lower-case a parameter name the way every store and rule table expects.
///
/// Only ASCII letters are folded; other characters pass through unchanged.
pub fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Per-effect bag of named `f32` values.
///
/// Keys are stored lower-cased, so `"WetLevel"` and `"wetlevel"` address the
/// same slot. Lookups compare case-insensitively in place, which means
/// updating an existing name never allocates; only the first write of a new
/// name does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    entries: Vec<(String, f32)>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `name`. No range validation happens here.
    pub fn set(&mut self, name: &str, value: f32) {
        match self.slot_mut(name) {
            Some(slot) => *slot = value,
            None => self.entries.push((normalize_name(name), value)),
        }
    }

    /// The stored value, or `None` if `name` was never set.
    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|&(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Make room for `additional` new names without growing the table.
    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    /// Number of names the table holds before it has to grow.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Iterate `(lower-cased name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), *value))
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut f32> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Accepted range for one named control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    /// Lower-case name
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    /// Clamp into `[min, max]`; NaN maps to `min`.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// How an effect validates writes to its parameter store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamRules {
    /// Any name, any value; stored as given.
    Open,
    /// Only the listed names; values are clamped to their range.
    Bounded(&'static [ParamRange]),
}

impl ParamRules {
    /// The value that would be stored for this write, or `None` if the name
    /// is rejected.
    pub fn resolve(&self, name: &str, value: f32) -> Option<f32> {
        match self {
            ParamRules::Open => Some(value),
            ParamRules::Bounded(ranges) => ranges
                .iter()
                .find(|range| range.name.eq_ignore_ascii_case(name))
                .map(|range| range.clamp(value)),
        }
    }
}
