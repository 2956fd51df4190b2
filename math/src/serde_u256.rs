//! Serde adapter for [`U256`] state fields, encoded as four little-endian limbs.
//!
//! Use with `#[serde(with = "puddel_math::serde_u256")]`.

use crate::wide::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    value.0.serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let limbs = <[u64; 4]>::deserialize(deserializer)?;
    Ok(U256(limbs))
}

/// The same encoding for map values keyed by anything serde can handle.
pub mod map {
    use super::U256;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<K, S>(value: &BTreeMap<K, U256>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize + Ord,
        S: Serializer,
    {
        let limbs: BTreeMap<&K, [u64; 4]> = value.iter().map(|(k, v)| (k, v.0)).collect();
        limbs.serialize(serializer)
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeMap<K, U256>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let limbs = BTreeMap::<K, [u64; 4]>::deserialize(deserializer)?;
        Ok(limbs.into_iter().map(|(k, v)| (k, U256(v))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Holder {
        #[serde(with = "crate::serde_u256")]
        value: U256,
        #[serde(with = "crate::serde_u256::map")]
        per_key: BTreeMap<u32, U256>,
    }

    #[test]
    fn wide_values_survive_bincode() {
        let mut per_key = BTreeMap::new();
        per_key.insert(7, U256::MAX - U256::one());
        let holder = Holder {
            value: U256::from(u128::MAX) * U256::from(3u64),
            per_key,
        };
        let bytes = bincode::serialize(&holder).unwrap();
        let back: Holder = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, holder);
    }
}
