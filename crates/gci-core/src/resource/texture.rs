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

//! Defines data structures related to GPU textures and render targets.

use super::{GpuDescriptorHandle, GpuNativeHandle, GpuResource, GpuResourceCore};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureDimension {
    /// A one-dimensional texture.
    D1,
    /// A two-dimensional texture.
    #[default]
    D2,
    /// A three-dimensional (volumetric) texture.
    D3,
}

/// The texel format of a texture or render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// One 8-bit unsigned normalized component.
    R8Unorm,
    /// Two 8-bit unsigned normalized components.
    Rg8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA).
    #[default]
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA) in the sRGB color space.
    Rgba8UnormSrgb,
    /// Four 8-bit unsigned normalized components (BGRA). A common swap chain format.
    Bgra8Unorm,
    /// Four 8-bit unsigned normalized components (BGRA) in the sRGB color space.
    Bgra8UnormSrgb,
    /// Four 16-bit float components.
    Rgba16Float,
    /// One 32-bit float component.
    R32Float,
    /// Four 32-bit float components.
    Rgba32Float,
    /// A 24-bit depth format with an 8-bit stencil component.
    Depth24PlusStencil8,
    /// A 32-bit float depth format.
    Depth32Float,
}

impl TextureFormat {
    /// Returns the size in bytes of a single texel.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::Rg8Unorm => 2,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::R32Float => 4,
            TextureFormat::Rgba32Float => 16,
            TextureFormat::Depth24PlusStencil8 => 4,
            TextureFormat::Depth32Float => 4,
        }
    }

    /// Returns `true` for depth or depth-stencil formats.
    pub fn is_depth_stencil(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth24PlusStencil8 | TextureFormat::Depth32Float
        )
    }
}

bitflags! {
    /// A set of flags describing the allowed usages of a [`GpuTexture`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TextureUsage: u32 {
        /// The texture can be used as the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The texture can be used as the destination of a copy operation.
        const COPY_DST = 1 << 1;
        /// The texture can be sampled by shaders.
        const SHADER_RESOURCE = 1 << 2;
        /// The texture can be read and written by shaders.
        const UNORDERED_ACCESS = 1 << 3;
        /// The texture can be bound as a color render target.
        const RENDER_TARGET = 1 << 4;
        /// The texture can be bound as a depth-stencil target.
        const DEPTH_STENCIL = 1 << 5;
    }
}

/// The size of a texture in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent3D {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth in texels for 3D textures, array layers otherwise.
    pub depth_or_array_layers: u32,
}

impl Extent3D {
    /// A 2D extent with a single layer.
    pub const fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    /// Returns `true` if any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth_or_array_layers == 0
    }
}

/// A descriptor used to create a [`GpuTexture`].
#[derive(Debug, Clone, Default)]
pub struct TextureCreateInfo<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The dimensions of the texture.
    pub size: Extent3D,
    /// The number of mipmap levels. Zero means one.
    pub mip_level_count: u32,
    /// The dimensionality of the texture.
    pub dimension: TextureDimension,
    /// The texel format.
    pub format: TextureFormat,
    /// How the texture will be used.
    pub usage: TextureUsage,
}

impl TextureCreateInfo<'_> {
    /// The number of bytes the described texture occupies, ignoring backend
    /// padding. `None` if the total does not fit in a `u64`.
    pub fn estimated_byte_size(&self) -> Option<u64> {
        estimate_texture_bytes(self.size, self.mip_level_count, self.format)
    }
}

/// Fills in defaults and rejects unusable texture create infos.
///
/// Zero mip levels and zero layers are promoted to one. An extent with a zero
/// width or height, a depth format without `DEPTH_STENCIL` usage and
/// a mip chain longer than the extent allows and a byte size overflowing `u64`
/// are rejected.
pub fn validate_texture_create_info(info: &mut TextureCreateInfo<'_>) -> bool {
    let label = info.label.as_deref().unwrap_or("unnamed").to_string();
    if info.mip_level_count == 0 {
        info.mip_level_count = 1;
    }
    if info.size.depth_or_array_layers == 0 {
        info.size.depth_or_array_layers = 1;
    }
    if info.size.is_empty() {
        log::warn!("Texture '{}': empty extent {:?}.", label, info.size);
        return false;
    }
    if info.format.is_depth_stencil() && !info.usage.contains(TextureUsage::DEPTH_STENCIL) {
        log::warn!(
            "Texture '{}': depth format {:?} without DEPTH_STENCIL usage.",
            label,
            info.format
        );
        return false;
    }
    let largest = info.size.width.max(info.size.height);
    let max_mips = u32::BITS - largest.leading_zeros();
    if info.mip_level_count > max_mips {
        log::warn!(
            "Texture '{}': {} mip levels requested, at most {} fit.",
            label,
            info.mip_level_count,
            max_mips
        );
        return false;
    }
    if info.estimated_byte_size().is_none() {
        log::warn!(
            "Texture '{}': {:?} with {} mips overflows the addressable size.",
            label,
            info.size,
            info.mip_level_count
        );
        return false;
    }
    true
}

/// The native half of a [`GpuTexture`], implemented once per backend.
pub trait GpuTextureBackend: Send + Sync {
    /// The backend object behind the texture.
    fn native_handle(&self) -> GpuNativeHandle;

    /// Returns the backend object as `Any`, for backends that need their concrete type back.
    fn as_any(&self) -> &dyn Any;
}

/// A GPU texture.
pub struct GpuTexture {
    core: GpuResourceCore,
    size: Extent3D,
    byte_size: u64,
    mip_level_count: u32,
    dimension: TextureDimension,
    format: TextureFormat,
    usage: TextureUsage,
    backend: Box<dyn GpuTextureBackend>,
}

impl fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuTexture")
            .field("core", &self.core)
            .field("size", &self.size)
            .field("mip_level_count", &self.mip_level_count)
            .field("format", &self.format)
            .field("usage", &self.usage)
            .finish()
    }
}

impl GpuTexture {
    /// Assembles a texture from a validated create info and its native half.
    pub fn new(
        core: GpuResourceCore,
        info: &TextureCreateInfo<'_>,
        backend: Box<dyn GpuTextureBackend>,
    ) -> Self {
        Self {
            core,
            size: info.size,
            byte_size: info.estimated_byte_size().unwrap_or(u64::MAX),
            mip_level_count: info.mip_level_count,
            dimension: info.dimension,
            format: info.format,
            usage: info.usage,
            backend,
        }
    }

    /// The dimensions of mip level zero.
    pub fn size(&self) -> Extent3D {
        self.size
    }

    /// The number of mipmap levels.
    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    /// The dimensionality of the texture.
    pub fn dimension(&self) -> TextureDimension {
        self.dimension
    }

    /// The texel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The allowed usages.
    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    /// The native half of the texture.
    pub fn backend(&self) -> &dyn GpuTextureBackend {
        self.backend.as_ref()
    }

    /// The number of bytes all mip levels occupy, ignoring backend padding.
    pub fn estimated_byte_size(&self) -> u64 {
        self.byte_size
    }
}

fn estimate_texture_bytes(
    size: Extent3D,
    mip_level_count: u32,
    format: TextureFormat,
) -> Option<u64> {
    let bpp = format.bytes_per_pixel() as u64;
    let layers = size.depth_or_array_layers.max(1) as u64;
    (0..mip_level_count.max(1)).try_fold(0u64, |total, mip| {
        let w = size.width.checked_shr(mip).unwrap_or(0).max(1) as u64;
        let h = size.height.checked_shr(mip).unwrap_or(0).max(1) as u64;
        let level = w.checked_mul(h)?.checked_mul(bpp)?.checked_mul(layers)?;
        total.checked_add(level)
    })
}

impl GpuResource for GpuTexture {
    fn resource_core(&self) -> &GpuResourceCore {
        &self.core
    }

    fn native_handle(&self) -> GpuNativeHandle {
        self.backend.native_handle()
    }
}

/// A view a command list can render into.
///
/// Either wraps a [`GpuTexture`] created with render-target usage, or stands for a
/// swap chain back buffer owned by the presentation engine.
#[derive(Debug, Clone)]
pub struct GpuRenderTarget {
    /// The texture behind the view, when it is not a swap chain buffer.
    pub texture: Option<Arc<GpuTexture>>,
    /// The native resource the view points into.
    pub native: GpuNativeHandle,
    /// The view descriptor bound at record time.
    pub view: GpuDescriptorHandle,
    /// The view format.
    pub format: TextureFormat,
    /// The view extent.
    pub size: Extent3D,
}

impl GpuRenderTarget {
    /// Returns `true` for depth-stencil views.
    pub fn is_depth_stencil(&self) -> bool {
        self.format.is_depth_stencil()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{GpuResourceBaseType, GpuResourceId, ResourceMemoryInfo};

    struct NoopTexture;

    impl GpuTextureBackend for NoopTexture {
        fn native_handle(&self) -> GpuNativeHandle {
            GpuNativeHandle(0x7E)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn zero_mips_and_layers_are_promoted() {
        let mut info = TextureCreateInfo {
            size: Extent3D {
                width: 64,
                height: 32,
                depth_or_array_layers: 0,
            },
            ..Default::default()
        };
        assert!(validate_texture_create_info(&mut info));
        assert_eq!(info.mip_level_count, 1);
        assert_eq!(info.size.depth_or_array_layers, 1);
    }

    #[test]
    fn rejects_bad_infos() {
        let mut empty = TextureCreateInfo::default();
        assert!(!validate_texture_create_info(&mut empty));

        let mut depth = TextureCreateInfo {
            size: Extent3D::new_2d(16, 16),
            format: TextureFormat::Depth32Float,
            usage: TextureUsage::SHADER_RESOURCE,
            ..Default::default()
        };
        assert!(!validate_texture_create_info(&mut depth));

        let mut mips = TextureCreateInfo {
            size: Extent3D::new_2d(16, 16),
            mip_level_count: 6,
            ..Default::default()
        };
        assert!(!validate_texture_create_info(&mut mips));
        mips.mip_level_count = 5;
        assert!(validate_texture_create_info(&mut mips));
    }

    #[test]
    fn estimated_size_covers_mip_chain() {
        let mut info = TextureCreateInfo {
            size: Extent3D::new_2d(4, 4),
            mip_level_count: 3,
            format: TextureFormat::R8Unorm,
            ..Default::default()
        };
        assert!(validate_texture_create_info(&mut info));
        let core = GpuResourceCore::new(
            GpuResourceId(9),
            GpuResourceBaseType::Texture,
            None,
            ResourceMemoryInfo::default(),
        );
        let texture = GpuTexture::new(core, &info, Box::new(NoopTexture));
        assert_eq!(texture.estimated_byte_size(), 16 + 4 + 1);
        assert_eq!(texture.native_handle(), GpuNativeHandle(0x7E));
    }

    #[test]
    fn overflowing_size_is_rejected() {
        let mut wide = TextureCreateInfo {
            size: Extent3D::new_2d(u32::MAX, u32::MAX),
            format: TextureFormat::R8Unorm,
            ..Default::default()
        };
        assert_eq!(
            wide.estimated_byte_size(),
            Some(u32::MAX as u64 * u32::MAX as u64)
        );
        assert!(validate_texture_create_info(&mut wide));

        wide.format = TextureFormat::Rgba8Unorm;
        assert_eq!(wide.estimated_byte_size(), None);
        assert!(!validate_texture_create_info(&mut wide));

        let mut layered = TextureCreateInfo {
            size: Extent3D {
                width: 1 << 16,
                height: 1 << 16,
                depth_or_array_layers: u32::MAX,
            },
            mip_level_count: 17,
            format: TextureFormat::R8Unorm,
            ..Default::default()
        };
        assert!(!validate_texture_create_info(&mut layered));
    }
}
