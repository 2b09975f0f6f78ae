//! The record capability consumed by writers and readers.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A payload that can be stored in a frame.
///
/// Records are opaque to the file format: a writer only needs
/// [`Record::encode`] and a reader only needs [`Record::decode`]. Decoding
/// happens in place so a caller can reuse one value across a whole file.
///
/// An empty payload is a valid record. Readers never call `decode` with an
/// empty slice; they reset the record to [`Default`] instead.
pub trait Record: Default {
    /// Serializes this record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized.
    fn encode(&self) -> CodecResult<Vec<u8>>;

    /// Replaces the contents of this record with the decoded `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid encoding.
    fn decode(&mut self, bytes: &[u8]) -> CodecResult<()>;
}

impl Record for Vec<u8> {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        Ok(self.clone())
    }

    fn decode(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.clear();
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Adapts any serde type into a [`Record`] stored as CBOR.
///
/// ```
/// use evio_codec::{Cbor, Record};
///
/// let record = Cbor(vec![1u32, 2, 3]);
/// let bytes = record.encode().unwrap();
///
/// let mut decoded = Cbor::<Vec<u32>>::default();
/// decoded.decode(&bytes).unwrap();
/// assert_eq!(decoded, record);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cbor<T>(pub T);

impl<T> Record for Cbor<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(&self.0)
    }

    fn decode(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.0 = from_cbor(bytes)?;
        Ok(())
    }
}

/// Serializes a value to CBOR bytes.
///
/// # Errors
///
/// Returns `EncodingFailed` if serialization fails.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|err| CodecError::encoding_failed(err.to_string()))?;
    Ok(buf)
}

/// Deserializes a value from CBOR bytes.
///
/// # Errors
///
/// Returns `DecodingFailed` if the bytes are not a valid encoding of `T`.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::from_reader(bytes).map_err(|err| CodecError::decoding_failed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Hit {
        channel: u16,
        energy: i64,
        label: String,
    }

    #[test]
    fn raw_bytes_record_roundtrip() {
        let record = vec![0xCA, 0xFE];
        let bytes = record.encode().unwrap();

        let mut decoded = vec![9, 9, 9, 9];
        decoded.decode(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn cbor_record_roundtrip() {
        let record = Cbor(Hit {
            channel: 12,
            energy: -40,
            label: "ecal".to_string(),
        });
        let bytes = record.encode().unwrap();

        let mut decoded = Cbor::<Hit>::default();
        decoded.decode(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn cbor_decode_garbage_fails() {
        let mut decoded = Cbor::<Hit>::default();
        let result = decoded.decode(&[0xFF, 0x00, 0x13]);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn cbor_decode_wrong_shape_fails() {
        let bytes = to_cbor(&"just a string").unwrap();
        let result: CodecResult<Hit> = from_cbor(&bytes);
        assert!(result.is_err());
    }
}
