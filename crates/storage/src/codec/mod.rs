//! Object codecs
//!
//! Every object written by a container passes through a
//! [`Codec`](docmap_core::Codec). [`JsonCodec`] maps any serde type to a JSON
//! object document and back.
//!
//! # Usage
//!
//! ```
//! use docmap_core::{Codec, DocId};
//! use docmap_storage::codec::JsonCodec;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Person { name: String }
//!
//! let codec = JsonCodec::<Person>::new();
//! let doc = codec.encode(&Person { name: "Roy".into() }).unwrap();
//! let back = codec.decode(&DocId::new("1"), &doc).unwrap();
//! assert_eq!(back.name, "Roy");
//! ```

mod json;

pub use json::JsonCodec;
