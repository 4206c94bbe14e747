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

//! Backend-neutral description of shader inputs.

use crate::resource::ShaderStageFlags;
use serde::{Deserialize, Serialize};

/// The maximum number of constants in one [`ConstantGroup`].
pub const MAX_CONSTANT_GROUP_SIZE: usize = 32;
/// The maximum number of [`ConstantGroup`]s in one signature.
pub const MAX_CONSTANT_GROUPS_NUM: usize = 6;
/// The maximum number of descriptors in one [`DescriptorSetDesc`].
pub const MAX_DESCRIPTOR_SET_SIZE: usize = 16;
/// The maximum number of slots one [`DescriptorSetDesc`] may span, array elements included.
pub const MAX_DESCRIPTOR_SET_SLOTS: u32 = 1 << 20;
/// The maximum number of [`DescriptorSetDesc`]s in one signature.
pub const MAX_DESCRIPTOR_SETS_NUM: usize = 8;

/// A stable numeric id naming one shader input, used at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShaderInputRefId(pub u32);

/// The data type of a root constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderConstantFormat {
    /// One 32-bit float.
    Float32,
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
    /// One 32-bit signed integer.
    Sint32,
    /// Four 32-bit signed integers.
    Sint32x4,
    /// One 32-bit unsigned integer.
    Uint32,
    /// Four 32-bit unsigned integers.
    Uint32x4,
    /// A 4x4 matrix of 32-bit floats.
    Mat4x4Float32,
}

impl ShaderConstantFormat {
    /// The size of the constant in 32-bit words.
    pub fn dword_size(&self) -> u32 {
        match self {
            ShaderConstantFormat::Float32
            | ShaderConstantFormat::Sint32
            | ShaderConstantFormat::Uint32 => 1,
            ShaderConstantFormat::Float32x2 => 2,
            ShaderConstantFormat::Float32x3 => 3,
            ShaderConstantFormat::Float32x4
            | ShaderConstantFormat::Sint32x4
            | ShaderConstantFormat::Uint32x4 => 4,
            ShaderConstantFormat::Mat4x4Float32 => 16,
        }
    }

    /// The size of the constant in bytes.
    pub fn byte_size(&self) -> u32 {
        self.dword_size() * 4
    }
}

/// Which shader stages may read a constant group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderConstantAccessClass {
    /// Every graphics stage.
    AllGraphics,
    /// The vertex stage only.
    VertexOnly,
    /// The hull stage only.
    HullOnly,
    /// The domain stage only.
    DomainOnly,
    /// The geometry stage only.
    GeometryOnly,
    /// The pixel stage only.
    PixelOnly,
    /// Every stage before rasterization.
    PreRasterization,
    /// The compute stage only.
    Compute,
}

impl ShaderConstantAccessClass {
    /// The union of the stages eligible under this class.
    pub fn stage_mask(&self) -> ShaderStageFlags {
        match self {
            ShaderConstantAccessClass::AllGraphics => ShaderStageFlags::ALL_GRAPHICS,
            ShaderConstantAccessClass::VertexOnly => ShaderStageFlags::VERTEX,
            ShaderConstantAccessClass::HullOnly => ShaderStageFlags::HULL,
            ShaderConstantAccessClass::DomainOnly => ShaderStageFlags::DOMAIN,
            ShaderConstantAccessClass::GeometryOnly => ShaderStageFlags::GEOMETRY,
            ShaderConstantAccessClass::PixelOnly => ShaderStageFlags::PIXEL,
            ShaderConstantAccessClass::PreRasterization => {
                ShaderStageFlags::ALL_GRAPHICS - ShaderStageFlags::PIXEL
            }
            ShaderConstantAccessClass::Compute => ShaderStageFlags::COMPUTE,
        }
    }
}

/// One root constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderConstantDesc {
    /// The shader-side binding (register) index.
    pub binding_index: u32,
    /// The id used to bind the constant.
    pub ref_id: ShaderInputRefId,
    /// The data type.
    pub format: ShaderConstantFormat,
}

/// A group of root constants sharing a stage visibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstantGroup {
    /// Which stages may read the group.
    pub access_class: ShaderConstantAccessClass,
    /// The constants, in layout order.
    pub constants: Vec<ShaderConstantDesc>,
}

/// The kind of resource a descriptor binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorType {
    /// A constant (uniform) buffer.
    ConstantBuffer,
    /// A read-only buffer.
    BufferShaderResource,
    /// A read-write buffer.
    BufferUnorderedAccess,
    /// A sampled texture.
    TextureShaderResource,
    /// A read-write texture.
    TextureUnorderedAccess,
    /// A sampler.
    Sampler,
}

impl DescriptorType {
    /// Returns `true` for [`DescriptorType::Sampler`].
    pub fn is_sampler(&self) -> bool {
        matches!(self, DescriptorType::Sampler)
    }

    /// Returns `true` for descriptors that bind a buffer.
    pub fn is_buffer(&self) -> bool {
        matches!(
            self,
            DescriptorType::ConstantBuffer
                | DescriptorType::BufferShaderResource
                | DescriptorType::BufferUnorderedAccess
        )
    }
}

/// Binding details of a descriptor, depending on whether it is a resource or a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorInfo {
    /// A resource descriptor.
    Resource {
        /// The shader-side register.
        shader_register: u32,
        /// The number of array elements. Zero and one both mean a single resource.
        array_size: u32,
    },
    /// A sampler descriptor.
    Sampler {
        /// The shader-side register.
        shader_register: u32,
    },
}

impl DescriptorInfo {
    /// The shader-side register.
    pub fn shader_register(&self) -> u32 {
        match self {
            DescriptorInfo::Resource {
                shader_register, ..
            }
            | DescriptorInfo::Sampler { shader_register } => *shader_register,
        }
    }

    /// The number of descriptor slots this entry occupies.
    pub fn slot_count(&self) -> u32 {
        match self {
            DescriptorInfo::Resource { array_size, .. } => (*array_size).max(1),
            DescriptorInfo::Sampler { .. } => 1,
        }
    }
}

/// One descriptor of a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderDescriptorDesc {
    /// The id used to bind the descriptor.
    pub ref_id: ShaderInputRefId,
    /// The kind of resource bound.
    pub descriptor_type: DescriptorType,
    /// Register and array details.
    pub info: DescriptorInfo,
}

/// A group of descriptors bound together and visible to the same stages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescriptorSetDesc {
    /// Which stages see the set.
    pub visibility: ShaderStageFlags,
    /// The descriptors, in layout order.
    pub descriptors: Vec<ShaderDescriptorDesc>,
}

/// The complete shader input description of a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RootSignatureDesc {
    /// Root constant groups.
    pub constant_groups: Vec<ConstantGroup>,
    /// Descriptor sets.
    pub descriptor_sets: Vec<DescriptorSetDesc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_class_masks() {
        assert_eq!(
            ShaderConstantAccessClass::VertexOnly.stage_mask(),
            ShaderStageFlags::VERTEX
        );
        let pre = ShaderConstantAccessClass::PreRasterization.stage_mask();
        assert!(pre.contains(ShaderStageFlags::GEOMETRY));
        assert!(!pre.contains(ShaderStageFlags::PIXEL));
        assert!(!ShaderConstantAccessClass::AllGraphics
            .stage_mask()
            .contains(ShaderStageFlags::COMPUTE));
    }

    #[test]
    fn descriptor_slots() {
        let array = DescriptorInfo::Resource {
            shader_register: 2,
            array_size: 4,
        };
        assert_eq!(array.slot_count(), 4);
        assert_eq!(array.shader_register(), 2);
        let single = DescriptorInfo::Resource {
            shader_register: 0,
            array_size: 0,
        };
        assert_eq!(single.slot_count(), 1);
        assert_eq!(ShaderConstantFormat::Mat4x4Float32.byte_size(), 64);
    }
}
