use serde::{Deserialize, Serialize};
use std::fmt;

/// A single kernel command line parameter.
///
/// An empty value renders as a bare flag (`quiet`), anything else as
/// `key=value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl Param {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn flag(key: impl Into<String>) -> Self {
        Self::new(key, "")
    }

    pub fn parse(s: impl AsRef<str>) -> Self {
        let s = s.as_ref();
        match s.split_once('=') {
            Some((key, value)) => Self::new(key, value),
            None => Self::flag(s),
        }
    }

    pub fn is_flag(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_flag() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}={}", self.key, self.value)
        }
    }
}

/// Ordered list of kernel parameters.
///
/// Unlike a key/value map, repeated keys are kept: the guest kernel needs
/// both `console=hvc0` and `console=hvc1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelParams {
    params: Vec<Param>,
}

impl KernelParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, param: Param) -> &mut Self {
        self.params.push(param);
        self
    }

    pub fn extend(&mut self, params: impl IntoIterator<Item = Param>) -> &mut Self {
        self.params.extend(params);
        self
    }

    /// Drops every parameter with the given key and value.
    pub fn remove(&mut self, key: &str, value: &str) -> &mut Self {
        self.params.retain(|p| !(p.key == key && p.value == value));
        self
    }

    pub fn contains(&self, param: &Param) -> bool {
        self.params.contains(param)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn build(&self) -> String {
        self.params
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<Param> for KernelParams {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a KernelParams {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
