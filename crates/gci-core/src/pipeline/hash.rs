// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Content hashing of pipeline create infos.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// A 64-bit content hash of a create info's canonical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PipelineConfigHash(pub u64);

/// Encodes a create info into its canonical byte form.
///
/// The encoding covers every field, including the payload of enum variants, so
/// two infos produce the same bytes iff they are equal field by field.
pub fn encode_create_info<T: Serialize>(info: &T) -> Result<Vec<u8>, PipelineError> {
    bincode::serde::encode_to_vec(info, bincode::config::standard())
        .map_err(|err| PipelineError::EncodingFailed(err.to_string()))
}

/// Hashes canonical create info bytes.
pub fn hash_config_bytes(bytes: &[u8]) -> PipelineConfigHash {
    PipelineConfigHash(xxhash_rust::xxh3::xxh3_64(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    enum Payload {
        A(u32),
        B(u32),
    }

    #[test]
    fn variant_payloads_are_part_of_the_bytes() {
        let a = encode_create_info(&Payload::A(1)).unwrap();
        let b = encode_create_info(&Payload::B(1)).unwrap();
        let a2 = encode_create_info(&Payload::A(2)).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, a2);
        assert_eq!(hash_config_bytes(&a), hash_config_bytes(&a.clone()));
        assert_ne!(hash_config_bytes(&a), hash_config_bytes(&b));
    }
}
