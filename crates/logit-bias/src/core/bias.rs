use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use super::BiasError;

/// Strongest suppression a provider accepts for a token.
pub const MIN_BIAS: i32 = -100;
/// Strongest encouragement a provider accepts for a token.
pub const MAX_BIAS: i32 = 100;

/// Checks that `bias` lies in `[MIN_BIAS, MAX_BIAS]`.
pub fn validate_bias(token_id: u32, bias: i32) -> Result<i32, BiasError> {
    if (MIN_BIAS..=MAX_BIAS).contains(&bias) {
        Ok(bias)
    } else {
        Err(BiasError::InvalidBiasValue { token_id, bias })
    }
}

/// Mutable token-id → bias mapping owned by a single [`RequestSettings`](crate::RequestSettings).
///
/// Values are range-checked on every write and rejected rather than clamped,
/// so a bad value surfaces at the call that introduced it. Entries are kept
/// ordered by token id, which makes the serialized payload deterministic.
///
/// Repeated writes to the same token follow last-write-wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u32, i32>", into = "BTreeMap<u32, i32>")]
pub struct BiasMap {
    entries: BTreeMap<u32, i32>,
}

impl BiasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the bias for `token_id`.
    ///
    /// Fails with [`BiasError::InvalidBiasValue`] when `bias` is outside
    /// `[-100, 100]`; the map is left untouched in that case.
    pub fn set(&mut self, token_id: u32, bias: i32) -> Result<(), BiasError> {
        let bias = validate_bias(token_id, bias)?;
        let previous = self.entries.insert(token_id, bias);
        debug!(token_id, bias, ?previous, "logit bias set");
        Ok(())
    }

    /// Deletes the entry for `token_id`, returning the bias it held.
    pub fn remove(&mut self, token_id: u32) -> Option<i32> {
        let removed = self.entries.remove(&token_id);
        debug!(token_id, removed = removed.is_some(), "logit bias removed");
        removed
    }

    /// Bans `token_id` by giving it the minimum bias.
    pub fn suppress(&mut self, token_id: u32) {
        self.entries.insert(token_id, MIN_BIAS);
        debug!(token_id, "token suppressed");
    }

    pub fn suppress_all(&mut self, token_ids: impl IntoIterator<Item = u32>) {
        for token_id in token_ids {
            self.suppress(token_id);
        }
    }

    /// Applies every `(token_id, bias)` pair, or none of them.
    ///
    /// All values are validated before the first insert, so an out-of-range
    /// value anywhere in `pairs` leaves the map exactly as it was.
    pub fn try_extend(
        &mut self,
        pairs: impl IntoIterator<Item = (u32, i32)>,
    ) -> Result<(), BiasError> {
        let pairs = pairs
            .into_iter()
            .map(|(token_id, bias)| validate_bias(token_id, bias).map(|bias| (token_id, bias)))
            .collect::<Result<Vec<_>, _>>()?;

        trace!(count = pairs.len(), "extending logit bias map");
        self.entries.extend(pairs);
        Ok(())
    }

    pub fn get(&self, token_id: u32) -> Option<i32> {
        self.entries.get(&token_id).copied()
    }

    pub fn contains(&self, token_id: u32) -> bool {
        self.entries.contains_key(&token_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.entries.iter().map(|(token_id, bias)| (*token_id, *bias))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Takes an immutable snapshot suitable for an outbound request.
    ///
    /// The snapshot owns its own copy of the entries; later calls to
    /// [`set`](Self::set) or [`remove`](Self::remove) never show up in it.
    pub fn to_payload(&self) -> LogitBias {
        trace!(entries = self.entries.len(), "logit bias snapshot taken");
        LogitBias(Arc::new(self.entries.clone()))
    }
}

impl TryFrom<BTreeMap<u32, i32>> for BiasMap {
    type Error = BiasError;

    fn try_from(entries: BTreeMap<u32, i32>) -> Result<Self, Self::Error> {
        for (token_id, bias) in &entries {
            validate_bias(*token_id, *bias)?;
        }
        Ok(Self { entries })
    }
}

impl TryFrom<HashMap<u32, i32>> for BiasMap {
    type Error = BiasError;

    fn try_from(entries: HashMap<u32, i32>) -> Result<Self, Self::Error> {
        Self::try_from(entries.into_iter().collect::<BTreeMap<_, _>>())
    }
}

impl From<BiasMap> for BTreeMap<u32, i32> {
    fn from(map: BiasMap) -> Self {
        map.entries
    }
}

/// Frozen view of a [`BiasMap`], as sent in the `logit_bias` request field.
///
/// Cloning is cheap and the snapshot can be shared across concurrently
/// in-flight requests. Serializes to a JSON object keyed by the decimal
/// token id, e.g. `{"3820": -100}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LogitBias(Arc<BTreeMap<u32, i32>>);

impl LogitBias {
    pub fn get(&self, token_id: u32) -> Option<i32> {
        self.0.get(&token_id).copied()
    }

    pub fn contains(&self, token_id: u32) -> bool {
        self.0.contains_key(&token_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.0.iter().map(|(token_id, bias)| (*token_id, *bias))
    }

    /// Returns the wire form: an object of stringified token ids to biases.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(token_id, bias)| (token_id.to_string(), Value::from(*bias)))
                .collect(),
        )
    }
}

impl From<&BiasMap> for LogitBias {
    fn from(map: &BiasMap) -> Self {
        map.to_payload()
    }
}

impl PartialEq<BTreeMap<u32, i32>> for LogitBias {
    fn eq(&self, other: &BTreeMap<u32, i32>) -> bool {
        self.0.as_ref() == other
    }
}
