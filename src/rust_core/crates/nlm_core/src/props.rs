//! Host-facing property map and registration metadata.
//!
//! The host hands filter arguments over as a loosely typed map. This module
//! holds that map, the registration signature the host validates against,
//! and typed accessors that turn type mismatches into configuration errors.

use rustc_hash::FxHashMap;

use crate::error::{NlmError, NlmResult};

// =============================================================================
// Registration Metadata
// =============================================================================

pub const PLUGIN_IDENTIFIER: &str = "com.lol.nlm2x";
pub const PLUGIN_NAMESPACE: &str = "nlm2x";
pub const PLUGIN_DESCRIPTION: &str = "Image Upscaling with NLMeans";
pub const FILTER_NAME: &str = "NLMeans2x";

/// Argument signature in the host's `name:type[:opt];` notation.
pub const PARAMETER_SCHEMA: &str = "clip:clip;a:int:opt;s:int:opt;h:float:opt;sdev:float:opt;";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Clip,
    Int,
    Float,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub optional: bool,
}

/// Parse a `name:type[:opt];...` signature into its parameter list.
pub fn parse_signature(signature: &str) -> NlmResult<Vec<ParamSpec>> {
    let mut specs = Vec::new();
    for entry in signature.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let mut fields = entry.split(':');
        let name = fields
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| NlmError::config(format!("malformed signature entry '{}'", entry)))?;
        let kind = match fields.next() {
            Some("clip") => ParamType::Clip,
            Some("int") => ParamType::Int,
            Some("float") => ParamType::Float,
            other => {
                return Err(NlmError::config(format!(
                    "unsupported type {:?} for parameter '{}'",
                    other, name
                )))
            }
        };
        let optional = match fields.next() {
            None => false,
            Some("opt") => true,
            Some(flag) => {
                return Err(NlmError::config(format!(
                    "unknown flag '{}' for parameter '{}'",
                    flag, name
                )))
            }
        };
        specs.push(ParamSpec {
            name: name.to_string(),
            kind,
            optional,
        });
    }
    Ok(specs)
}

/// Parameter list of the registered filter.
pub fn filter_params() -> NlmResult<Vec<ParamSpec>> {
    parse_signature(PARAMETER_SCHEMA)
}

// =============================================================================
// Property Map
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropValue {
    Int(i64),
    Float(f64),
}

/// Named scalar arguments supplied by the host. The clip itself travels
/// separately as a [`FrameSource`](crate::frame::FrameSource).
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    values: FxHashMap<String, PropValue>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PropValue) -> &mut Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.insert(key, PropValue::Int(value))
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.insert(key, PropValue::Float(value))
    }

    pub fn get(&self, key: &str) -> Option<PropValue> {
        self.values.get(key).copied()
    }

    /// Integer property; `None` when absent.
    pub fn get_int(&self, key: &str) -> NlmResult<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(PropValue::Int(v)) => Ok(Some(v)),
            Some(PropValue::Float(v)) => Err(NlmError::config(format!(
                "{} must be an integer, got {}",
                key, v
            ))),
        }
    }

    /// Float property; integers are widened. `None` when absent.
    pub fn get_float(&self, key: &str) -> NlmResult<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(PropValue::Int(v)) => Ok(Some(v as f64)),
            Some(PropValue::Float(v)) => Ok(Some(v)),
        }
    }

    /// Reject keys the signature does not declare and values whose type
    /// cannot satisfy the declared one.
    pub fn validate_against(&self, params: &[ParamSpec]) -> NlmResult<()> {
        for (key, value) in &self.values {
            let spec = params
                .iter()
                .find(|p| p.name == *key)
                .ok_or_else(|| NlmError::config(format!("unknown argument '{}'", key)))?;
            let compatible = matches!(
                (spec.kind, value),
                (ParamType::Int, PropValue::Int(_))
                    | (ParamType::Float, PropValue::Int(_))
                    | (ParamType::Float, PropValue::Float(_))
            );
            if !compatible {
                return Err(NlmError::config(format!(
                    "argument '{}' expects {:?}, got {:?}",
                    key, spec.kind, value
                )));
            }
        }
        Ok(())
    }
}

impl<K: Into<String>> FromIterator<(K, PropValue)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, PropValue)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
