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

use super::desc::{
    DescriptorInfo, DescriptorType, RootSignatureDesc, ShaderConstantAccessClass,
    ShaderConstantFormat, ShaderInputRefId, MAX_CONSTANT_GROUPS_NUM, MAX_CONSTANT_GROUP_SIZE,
    MAX_DESCRIPTOR_SETS_NUM, MAX_DESCRIPTOR_SET_SIZE, MAX_DESCRIPTOR_SET_SLOTS,
};
use crate::error::{PipelineError, RootSignatureError};
use crate::resource::{GpuNativeHandle, ShaderStageFlags};
use std::collections::HashMap;

/// One constant in the flattened constant array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantLayoutEntry {
    /// The id the constant is bound by.
    pub ref_id: ShaderInputRefId,
    /// The shader-side binding index.
    pub binding_index: u32,
    /// The data type.
    pub format: ShaderConstantFormat,
    /// The group the constant was declared in.
    pub group_index: u32,
    /// The offset of the constant, in dwords, from the start of all constants.
    pub dword_offset: u32,
    /// The stages that may read the constant.
    pub stage_mask: ShaderStageFlags,
}

/// One constant group in the flattened layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantGroupLayout {
    /// The declared access class.
    pub access_class: ShaderConstantAccessClass,
    /// The stages that may read the group.
    pub stage_mask: ShaderStageFlags,
    /// Index of the group's first entry in [`ConstantLayout::constants`].
    pub first_constant: u32,
    /// Number of constants in the group.
    pub constant_count: u32,
    /// Offset of the group's first dword.
    pub dword_offset: u32,
    /// Number of dwords the group spans.
    pub dword_count: u32,
}

/// Every root constant, laid out contiguously.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantLayout {
    /// Group ranges.
    pub groups: Vec<ConstantGroupLayout>,
    /// The flattened constants.
    pub constants: Vec<ConstantLayoutEntry>,
    /// Total size of all constants, in dwords.
    pub total_dwords: u32,
}

/// One descriptor in the flattened descriptor array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorLayoutEntry {
    /// The id the descriptor is bound by.
    pub ref_id: ShaderInputRefId,
    /// The kind of resource bound.
    pub descriptor_type: DescriptorType,
    /// Register and array details.
    pub info: DescriptorInfo,
    /// The set the descriptor was declared in.
    pub set_index: u32,
    /// The slot of the descriptor within its set.
    pub offset_in_set: u32,
    /// The slot of the descriptor in the contiguous descriptor array.
    pub global_offset: u32,
    /// The stages that see the descriptor.
    pub stage_mask: ShaderStageFlags,
}

/// One descriptor set in the flattened layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSetLayout {
    /// The stages that see the set.
    pub stage_mask: ShaderStageFlags,
    /// Index of the set's first entry in [`DescriptorLayout::descriptors`].
    pub first_descriptor: u32,
    /// Number of descriptors declared in the set.
    pub descriptor_count: u32,
    /// Offset of the set's first slot in the contiguous descriptor array.
    pub base_offset: u32,
    /// Number of slots the set spans.
    pub slot_count: u32,
}

/// Every descriptor, laid out contiguously set after set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorLayout {
    /// Set ranges.
    pub sets: Vec<DescriptorSetLayout>,
    /// The flattened descriptors.
    pub descriptors: Vec<DescriptorLayoutEntry>,
    /// Total number of descriptor slots.
    pub total_slots: u32,
}

/// A compiled, backend-neutral binding layout.
///
/// Immutable once compiled. Lookups by ref id go through hash maps into the
/// flattened arrays, which never move for the lifetime of the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSignature {
    active_stages_mask: ShaderStageFlags,
    constant_layout: ConstantLayout,
    descriptor_layout: DescriptorLayout,
    constant_map: HashMap<ShaderInputRefId, usize>,
    descriptor_map: HashMap<ShaderInputRefId, usize>,
}

impl RootSignature {
    /// Compiles `desc`, failing on any cap overflow or duplicate id.
    pub fn compile(desc: &RootSignatureDesc) -> Result<Self, RootSignatureError> {
        if desc.constant_groups.len() > MAX_CONSTANT_GROUPS_NUM {
            return Err(RootSignatureError::TooManyConstantGroups {
                count: desc.constant_groups.len(),
                max: MAX_CONSTANT_GROUPS_NUM,
            });
        }
        if desc.descriptor_sets.len() > MAX_DESCRIPTOR_SETS_NUM {
            return Err(RootSignatureError::TooManyDescriptorSets {
                count: desc.descriptor_sets.len(),
                max: MAX_DESCRIPTOR_SETS_NUM,
            });
        }

        let mut active_stages_mask = ShaderStageFlags::empty();

        let mut constant_layout = ConstantLayout::default();
        let mut constant_map = HashMap::new();
        for (group_index, group) in desc.constant_groups.iter().enumerate() {
            if group.constants.len() > MAX_CONSTANT_GROUP_SIZE {
                return Err(RootSignatureError::ConstantGroupTooLarge {
                    group: group_index,
                    count: group.constants.len(),
                    max: MAX_CONSTANT_GROUP_SIZE,
                });
            }
            let stage_mask = group.access_class.stage_mask();
            active_stages_mask |= stage_mask;

            let first_constant = constant_layout.constants.len() as u32;
            let group_offset = constant_layout.total_dwords;
            for constant in &group.constants {
                let index = constant_layout.constants.len();
                if constant_map.insert(constant.ref_id, index).is_some() {
                    return Err(RootSignatureError::DuplicateConstantRefId(constant.ref_id));
                }
                constant_layout.constants.push(ConstantLayoutEntry {
                    ref_id: constant.ref_id,
                    binding_index: constant.binding_index,
                    format: constant.format,
                    group_index: group_index as u32,
                    dword_offset: constant_layout.total_dwords,
                    stage_mask,
                });
                constant_layout.total_dwords += constant.format.dword_size();
            }
            constant_layout.groups.push(ConstantGroupLayout {
                access_class: group.access_class,
                stage_mask,
                first_constant,
                constant_count: group.constants.len() as u32,
                dword_offset: group_offset,
                dword_count: constant_layout.total_dwords - group_offset,
            });
        }

        let mut descriptor_layout = DescriptorLayout::default();
        let mut descriptor_map = HashMap::new();
        for (set_index, set) in desc.descriptor_sets.iter().enumerate() {
            if set.descriptors.len() > MAX_DESCRIPTOR_SET_SIZE {
                return Err(RootSignatureError::DescriptorSetTooLarge {
                    set: set_index,
                    count: set.descriptors.len(),
                    max: MAX_DESCRIPTOR_SET_SIZE,
                });
            }
            if set.visibility.is_empty() {
                return Err(RootSignatureError::EmptyStageVisibility {
                    element: format!("Descriptor set {set_index}"),
                });
            }
            active_stages_mask |= set.visibility;

            let first_descriptor = descriptor_layout.descriptors.len() as u32;
            let base_offset = descriptor_layout.total_slots;
            let mut offset_in_set = 0;
            for descriptor in &set.descriptors {
                let info_matches = descriptor.descriptor_type.is_sampler()
                    == matches!(descriptor.info, DescriptorInfo::Sampler { .. });
                if !info_matches {
                    return Err(RootSignatureError::DescriptorInfoMismatch(descriptor.ref_id));
                }
                let index = descriptor_layout.descriptors.len();
                if descriptor_map.insert(descriptor.ref_id, index).is_some() {
                    return Err(RootSignatureError::DuplicateDescriptorRefId(
                        descriptor.ref_id,
                    ));
                }
                descriptor_layout.descriptors.push(DescriptorLayoutEntry {
                    ref_id: descriptor.ref_id,
                    descriptor_type: descriptor.descriptor_type,
                    info: descriptor.info,
                    set_index: set_index as u32,
                    offset_in_set,
                    global_offset: base_offset + offset_in_set,
                    stage_mask: set.visibility,
                });
                offset_in_set = offset_in_set
                    .checked_add(descriptor.info.slot_count())
                    .filter(|slots| *slots <= MAX_DESCRIPTOR_SET_SLOTS)
                    .ok_or(RootSignatureError::DescriptorSetTooManySlots {
                        set: set_index,
                        max: MAX_DESCRIPTOR_SET_SLOTS,
                    })?;
            }
            descriptor_layout.total_slots += offset_in_set;
            descriptor_layout.sets.push(DescriptorSetLayout {
                stage_mask: set.visibility,
                first_descriptor,
                descriptor_count: set.descriptors.len() as u32,
                base_offset,
                slot_count: offset_in_set,
            });
        }

        log::trace!(
            "Compiled root signature: {} constants ({} dwords), {} descriptors ({} slots), stages {:?}",
            constant_layout.constants.len(),
            constant_layout.total_dwords,
            descriptor_layout.descriptors.len(),
            descriptor_layout.total_slots,
            active_stages_mask
        );

        Ok(Self {
            active_stages_mask,
            constant_layout,
            descriptor_layout,
            constant_map,
            descriptor_map,
        })
    }

    /// The union of every stage that reads any input.
    pub fn active_stages_mask(&self) -> ShaderStageFlags {
        self.active_stages_mask
    }

    /// The flattened constant layout.
    pub fn constant_layout(&self) -> &ConstantLayout {
        &self.constant_layout
    }

    /// The flattened descriptor layout.
    pub fn descriptor_layout(&self) -> &DescriptorLayout {
        &self.descriptor_layout
    }

    /// Looks up a constant by ref id.
    pub fn constant(&self, ref_id: ShaderInputRefId) -> Option<&ConstantLayoutEntry> {
        self.constant_map
            .get(&ref_id)
            .map(|&index| &self.constant_layout.constants[index])
    }

    /// Looks up a descriptor by ref id.
    pub fn descriptor(&self, ref_id: ShaderInputRefId) -> Option<&DescriptorLayoutEntry> {
        self.descriptor_map
            .get(&ref_id)
            .map(|&index| &self.descriptor_layout.descriptors[index])
    }

    /// Total size of all root constants, in dwords.
    pub fn total_constant_dwords(&self) -> u32 {
        self.constant_layout.total_dwords
    }

    /// Total number of descriptor slots.
    pub fn total_descriptor_slots(&self) -> u32 {
        self.descriptor_layout.total_slots
    }
}

/// Turns a compiled [`RootSignature`] into the backend's native binding object
/// (a root signature, a set of descriptor set layouts, a slot table...).
pub trait RootSignatureTranslator: Send + Sync {
    /// Creates the native binding object for `signature`.
    fn translate_root_signature(
        &self,
        signature: &RootSignature,
    ) -> Result<GpuNativeHandle, PipelineError>;
}
