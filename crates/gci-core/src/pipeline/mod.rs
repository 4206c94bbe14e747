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

//! Immutable pipeline state descriptors and their content-addressed cache.
//!
//! Every pipeline sub-state (blend, depth-stencil, rasterizer, vertex layout,
//! render target binding, root signature) and every full pipeline state object
//! is requested through a create info. The create info is encoded into its
//! canonical bytes, hashed into a [`PipelineConfigHash`], and looked up in the
//! [`PipelineStateDescriptorCache`]: bit-identical requests share one descriptor.

mod cache;
mod descriptor;
mod enums;
mod hash;
mod state;

pub use self::cache::{PipelineCacheStats, PipelineStateDescriptorCache};
pub use self::descriptor::{
    ComputePipelineBindings, GraphicsPipelineBindings, PipelineStateCreateInfo,
    PipelineStateDescriptor, PipelineStateDescriptorType,
};
pub use self::enums::*;
pub use self::hash::{encode_create_info, hash_config_bytes, PipelineConfigHash};
pub use self::state::*;
