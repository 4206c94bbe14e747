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

//! Shader stages and opaque shader bytecode objects.

use super::GpuNativeHandle;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Hull (tessellation control) shader.
    Hull,
    /// Domain (tessellation evaluation) shader.
    Domain,
    /// Geometry shader.
    Geometry,
    /// Pixel (fragment) shader.
    Pixel,
    /// Compute shader.
    Compute,
}

impl ShaderStage {
    /// The single-bit mask of this stage.
    pub fn flag(&self) -> ShaderStageFlags {
        match self {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::Hull => ShaderStageFlags::HULL,
            ShaderStage::Domain => ShaderStageFlags::DOMAIN,
            ShaderStage::Geometry => ShaderStageFlags::GEOMETRY,
            ShaderStage::Pixel => ShaderStageFlags::PIXEL,
            ShaderStage::Compute => ShaderStageFlags::COMPUTE,
        }
    }
}

bitflags! {
    /// A set of shader stages, used for visibility masks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ShaderStageFlags: u32 {
        /// Vertex stage.
        const VERTEX = 1 << 0;
        /// Hull stage.
        const HULL = 1 << 1;
        /// Domain stage.
        const DOMAIN = 1 << 2;
        /// Geometry stage.
        const GEOMETRY = 1 << 3;
        /// Pixel stage.
        const PIXEL = 1 << 4;
        /// Compute stage.
        const COMPUTE = 1 << 5;
        /// Every graphics stage.
        const ALL_GRAPHICS = Self::VERTEX.bits()
            | Self::HULL.bits()
            | Self::DOMAIN.bits()
            | Self::GEOMETRY.bits()
            | Self::PIXEL.bits();
    }
}

/// Identifies a shader within one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GpuShaderId(pub u64);

/// Describes a shader to be created by a device.
///
/// The bytecode is opaque to the core; only the backend interprets it.
#[derive(Debug, Clone)]
pub struct GpuShaderCreateInfo<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// The stage the bytecode targets.
    pub stage: ShaderStage,
    /// Backend-specific bytecode.
    pub bytecode: Cow<'a, [u8]>,
    /// The entry point name.
    pub entry_point: &'a str,
}

/// A compiled shader object.
#[derive(Debug)]
pub struct GpuShader {
    id: GpuShaderId,
    stage: ShaderStage,
    entry_point: String,
    label: Option<String>,
    native: GpuNativeHandle,
}

impl GpuShader {
    /// Wraps the native shader created for `info`.
    pub fn new(id: GpuShaderId, native: GpuNativeHandle, info: &GpuShaderCreateInfo<'_>) -> Self {
        Self {
            id,
            stage: info.stage,
            entry_point: info.entry_point.to_string(),
            label: info.label.map(str::to_string),
            native,
        }
    }

    /// The identifier of this shader.
    pub fn id(&self) -> GpuShaderId {
        self.id
    }

    /// The stage this shader runs in.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// The entry point name.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// The debug label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The backend object behind the shader.
    pub fn native_handle(&self) -> GpuNativeHandle {
        self.native
    }
}
