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

use super::descriptor::{PipelineStateCreateInfo, PipelineStateDescriptor, PipelineStateDescriptorType};
use super::hash::{encode_create_info, hash_config_bytes, PipelineConfigHash};
use crate::error::PipelineError;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type CacheKey = (PipelineStateDescriptorType, PipelineConfigHash);

struct CacheEntry {
    bytes: Vec<u8>,
    descriptor: Arc<dyn Any + Send + Sync>,
}

/// Counters of a [`PipelineStateDescriptorCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineCacheStats {
    /// Number of cached descriptors.
    pub entries: usize,
    /// Requests served from the cache.
    pub hits: u64,
    /// Requests that created a new descriptor.
    pub misses: u64,
}

/// A content-addressed cache of pipeline state descriptors.
///
/// Keys are `(descriptor type, content hash)`. Each bucket also keeps the
/// canonical bytes of its entries, so a hash collision between distinct infos
/// never aliases them onto one descriptor. Entries live as long as the cache.
#[derive(Default)]
pub struct PipelineStateDescriptorCache {
    entries: Mutex<HashMap<CacheKey, Vec<CacheEntry>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PipelineStateDescriptorCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Vec<CacheEntry>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn find<T: PipelineStateCreateInfo>(
        bucket: &[CacheEntry],
        bytes: &[u8],
    ) -> Option<Arc<PipelineStateDescriptor<T>>> {
        bucket
            .iter()
            .find(|entry| entry.bytes == bytes)
            .and_then(|entry| {
                entry
                    .descriptor
                    .clone()
                    .downcast::<PipelineStateDescriptor<T>>()
                    .ok()
            })
    }

    /// Returns the descriptor cached for `info`, if any.
    pub fn get<T: PipelineStateCreateInfo>(
        &self,
        info: &T,
    ) -> Result<Option<Arc<PipelineStateDescriptor<T>>>, PipelineError> {
        let bytes = encode_create_info(info)?;
        let key = (T::DESCRIPTOR_TYPE, hash_config_bytes(&bytes));
        Ok(self
            .lock()
            .get(&key)
            .and_then(|bucket| Self::find::<T>(bucket, &bytes)))
    }

    /// Returns the descriptor for `info`, calling `create` on a miss.
    ///
    /// `info` is validated before `create` runs. The cache lock is not held while
    /// `create` runs, so creation may itself request other descriptors. If two
    /// threads race on the same info, the first inserted descriptor wins and is
    /// returned to both.
    pub fn get_or_create<T, F>(
        &self,
        info: &T,
        create: F,
    ) -> Result<Arc<PipelineStateDescriptor<T>>, PipelineError>
    where
        T: PipelineStateCreateInfo,
        F: FnOnce(&T, PipelineConfigHash) -> Result<PipelineStateDescriptor<T>, PipelineError>,
    {
        let bytes = encode_create_info(info)?;
        let hash = hash_config_bytes(&bytes);
        let key = (T::DESCRIPTOR_TYPE, hash);

        if let Some(existing) = self
            .lock()
            .get(&key)
            .and_then(|bucket| Self::find::<T>(bucket, &bytes))
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("Pipeline cache hit: {:?} {:?}", T::DESCRIPTOR_TYPE, hash);
            return Ok(existing);
        }

        info.validate()
            .map_err(|details| PipelineError::InvalidCreateInfo {
                descriptor_type: T::DESCRIPTOR_TYPE,
                details,
            })?;
        let created = Arc::new(create(info, hash)?);

        let mut entries = self.lock();
        let bucket = entries.entry(key).or_default();
        if let Some(existing) = Self::find::<T>(bucket, &bytes) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(existing);
        }
        if !bucket.is_empty() {
            log::warn!(
                "Pipeline config hash collision on {:?} {:?}.",
                T::DESCRIPTOR_TYPE,
                hash
            );
        }
        bucket.push(CacheEntry {
            bytes,
            descriptor: created.clone(),
        });
        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("Pipeline cache miss: created {:?} {:?}", T::DESCRIPTOR_TYPE, hash);
        Ok(created)
    }

    /// The number of cached descriptors.
    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of cached descriptors of one kind.
    pub fn len_of(&self, descriptor_type: PipelineStateDescriptorType) -> usize {
        self.lock()
            .iter()
            .filter(|((ty, _), _)| *ty == descriptor_type)
            .map(|(_, bucket)| bucket.len())
            .sum()
    }

    /// Current counters.
    pub fn stats(&self) -> PipelineCacheStats {
        PipelineCacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for PipelineStateDescriptorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStateDescriptorCache")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{
        BlendStateCreateInfo, CompareFunction, DepthStencilStateCreateInfo, RenderTargetBlendDesc,
    };
    use crate::resource::GpuNativeHandle;
    use crate::root_signature::{RootSignature, RootSignatureDesc};
    use std::sync::atomic::AtomicU32;

    fn create_counting<T: PipelineStateCreateInfo<Compiled = ()>>(
        counter: &AtomicU32,
    ) -> impl FnOnce(&T, PipelineConfigHash) -> Result<PipelineStateDescriptor<T>, PipelineError> + '_
    {
        move |info, hash| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(PipelineStateDescriptor::new(
                hash,
                info.clone(),
                (),
                GpuNativeHandle(n as u64 + 1),
            ))
        }
    }

    #[test]
    fn identical_infos_share_one_descriptor() {
        let cache = PipelineStateDescriptorCache::new();
        let created = AtomicU32::new(0);
        let info = DepthStencilStateCreateInfo::default();

        let a = cache.get_or_create(&info, create_counting(&created)).unwrap();
        let b = cache
            .get_or_create(&info.clone(), create_counting(&created))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(created.load(Ordering::SeqCst), 1);

        let changed = DepthStencilStateCreateInfo {
            depth_compare: CompareFunction::Greater,
            ..info
        };
        let c = cache.get_or_create(&changed, create_counting(&created)).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_ne!(a.config_hash(), c.config_hash());
        assert_eq!(cache.stats(), PipelineCacheStats { entries: 2, hits: 1, misses: 2 });
    }

    #[test]
    fn kinds_do_not_alias() {
        let cache = PipelineStateDescriptorCache::new();
        let created = AtomicU32::new(0);
        let blend = BlendStateCreateInfo {
            targets: vec![RenderTargetBlendDesc::default()],
            ..Default::default()
        };
        cache.get_or_create(&blend, create_counting(&created)).unwrap();
        cache
            .get_or_create(&DepthStencilStateCreateInfo::default(), create_counting(&created))
            .unwrap();
        assert_eq!(cache.len_of(PipelineStateDescriptorType::Blend), 1);
        assert_eq!(cache.len_of(PipelineStateDescriptorType::DepthStencil), 1);
        assert!(cache.get(&blend).unwrap().is_some());
    }

    #[test]
    fn invalid_info_is_not_cached() {
        let cache = PipelineStateDescriptorCache::new();
        let created = AtomicU32::new(0);
        let info = DepthStencilStateCreateInfo {
            depth_test_enabled: false,
            depth_write_enabled: true,
            ..Default::default()
        };
        let err = cache
            .get_or_create(&info, create_counting(&created))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCreateInfo { .. }));
        assert_eq!(created.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_creation_is_not_cached() {
        let cache = PipelineStateDescriptorCache::new();
        let desc = RootSignatureDesc::default();
        let result = cache.get_or_create(&desc, |_, _| {
            Err(PipelineError::CompilationFailed {
                descriptor_type: PipelineStateDescriptorType::RootSignature,
                label: None,
            })
        });
        assert!(result.is_err());
        assert!(cache.is_empty());

        let ok = cache
            .get_or_create(&desc, |info, hash| {
                Ok(PipelineStateDescriptor::new(
                    hash,
                    info.clone(),
                    RootSignature::compile(info)?,
                    GpuNativeHandle(5),
                ))
            })
            .unwrap();
        assert_eq!(ok.root_signature().total_descriptor_slots(), 0);
    }

    #[test]
    fn concurrent_requests_converge() {
        let cache = Arc::new(PipelineStateDescriptorCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    cache
                        .get_or_create(&DepthStencilStateCreateInfo::default(), |info, hash| {
                            Ok(PipelineStateDescriptor::new(
                                hash,
                                *info,
                                (),
                                GpuNativeHandle(1),
                            ))
                        })
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
        assert_eq!(cache.len(), 1);
    }
}
