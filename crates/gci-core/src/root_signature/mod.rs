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

//! The root signature compiler.
//!
//! A [`RootSignatureDesc`] describes, in backend-neutral terms, which constants
//! and which resource/sampler descriptors the shaders of a pipeline consume.
//! [`RootSignature::compile`] flattens it into contiguous layouts and builds
//! ref-id lookup maps, so that bind calls resolve in O(1) by stable id. Turning
//! the compiled signature into a native binding object is the job of a
//! [`RootSignatureTranslator`], implemented by each backend.

mod compiler;
mod desc;

pub use self::compiler::{
    ConstantGroupLayout, ConstantLayout, ConstantLayoutEntry, DescriptorLayout,
    DescriptorLayoutEntry, DescriptorSetLayout, RootSignature, RootSignatureTranslator,
};
pub use self::desc::{
    ConstantGroup, DescriptorInfo, DescriptorSetDesc, DescriptorType, RootSignatureDesc,
    ShaderConstantAccessClass, ShaderConstantDesc, ShaderConstantFormat, ShaderDescriptorDesc,
    ShaderInputRefId, MAX_CONSTANT_GROUPS_NUM, MAX_CONSTANT_GROUP_SIZE, MAX_DESCRIPTOR_SETS_NUM,
    MAX_DESCRIPTOR_SET_SIZE, MAX_DESCRIPTOR_SET_SLOTS,
};
