//! CBOR document codec.
//!
//! Collections are stored as a single CBOR array of serde-serialized
//! entities. The codec is deliberately thin: it only maps `ciborium`
//! failures onto [`StorageError::Codec`].

use crate::error::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value as CBOR bytes.
///
/// # Errors
///
/// Returns [`StorageError::Codec`] if the value cannot be serialized.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> StorageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).map_err(|err| StorageError::codec(err.to_string()))?;
    Ok(bytes)
}

/// Decodes a value from CBOR bytes.
///
/// # Errors
///
/// Returns [`StorageError::Codec`] if the bytes are not valid CBOR for `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    ciborium::from_reader(bytes).map_err(|err| StorageError::codec(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: i64,
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn decode_rejects_garbage() {
        let result: StorageResult<Vec<Row>> = decode(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(StorageError::Codec(_))));
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        let bytes = encode(&"just a string").unwrap();
        let result: StorageResult<Vec<Row>> = decode(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn empty_collection_is_small() {
        let bytes = encode(&Vec::<Row>::new()).unwrap();
        assert_eq!(bytes, vec![0x80]);
    }

    proptest! {
        #[test]
        fn rows_survive_encoding(
            rows in prop::collection::vec(
                (any::<i64>(), "[a-z]{0,12}", prop::collection::vec("[a-z]{1,4}", 0..3)),
                0..16,
            )
        ) {
            let rows: Vec<Row> = rows
                .into_iter()
                .map(|(id, name, tags)| Row { id, name, tags })
                .collect();
            let decoded: Vec<Row> = decode(&encode(&rows).unwrap()).unwrap();
            prop_assert_eq!(decoded, rows);
        }
    }
}
