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

use crate::resource::{GpuRenderTarget, TextureFormat};
use serde::{Deserialize, Serialize};

/// Parameters of a swap chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapChainCreateInfo {
    /// Back buffer width, in pixels.
    pub width: u32,
    /// Back buffer height, in pixels.
    pub height: u32,
    /// Back buffer format.
    pub format: TextureFormat,
    /// Requested number of back buffers. Clamped by the device.
    pub buffer_count: u32,
    /// Format of the depth-stencil target shared by all frames, if any.
    pub depth_stencil_format: Option<TextureFormat>,
    /// Present without waiting for vertical blank when the display allows it.
    pub allow_tearing: bool,
}

impl Default for SwapChainCreateInfo {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            format: TextureFormat::Bgra8Unorm,
            buffer_count: crate::settings::MIN_FRAME_QUEUE_SIZE,
            depth_stencil_format: None,
            allow_tearing: false,
        }
    }
}

/// The native swap chain hook.
pub trait SwapChainBackend: Send {
    /// Queues the current back buffer for display.
    fn present(&mut self) -> bool;

    /// The back buffer the next frame renders into, as reported by the presentation engine.
    fn current_back_buffer_index(&self) -> u32;

    /// Number of back buffers in the ring.
    fn buffer_count(&self) -> u32;

    /// The render target view of back buffer `index`.
    fn back_buffer(&self, index: u32) -> Option<GpuRenderTarget>;

    /// The depth-stencil target shared by every frame, if one was requested.
    fn depth_stencil(&self) -> Option<GpuRenderTarget>;

    /// Recreates the back buffers at a new size.
    fn resize(&mut self, width: u32, height: u32) -> bool;
}
