//! serde_json backed codec

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use docmap_core::{Codec, DocId, Error, JsonValue, Result};

/// Codec for any `Serialize + DeserializeOwned` type
///
/// Documents must be JSON objects. Fields the type does not know about
/// (such as the key and parent fields a container stamps onto documents)
/// are ignored on decode unless the type denies unknown fields.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Create a codec
    pub fn new() -> Self {
        JsonCodec {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCodec")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<JsonValue> {
        let doc = serde_json::to_value(value).map_err(|e| Error::encode(e.to_string()))?;
        if !doc.is_object() {
            return Err(Error::encode(format!(
                "{} does not serialize to a JSON object",
                std::any::type_name::<T>()
            )));
        }
        Ok(doc)
    }

    fn decode(&self, id: &DocId, data: &JsonValue) -> Result<T> {
        T::deserialize(data).map_err(|e| Error::decode(id.clone(), e.to_string()))
    }
}
