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
use super::gpu::{SoftGpu, SoftPresentOrder};
use gci_core::error::PresentError;
use gci_core::presentation::{SwapChainBackend, SwapChainCreateInfo};
use gci_core::resource::{Extent3D, GpuDescriptorHandle, GpuRenderTarget, TextureFormat};
use std::sync::Arc;

/// A headless swap chain. Back buffers are bare descriptors and presenting only
/// advances the reported back buffer index.
#[derive(Debug)]
pub struct SoftSwapChain {
    gpu: Arc<SoftGpu>,
    info: SwapChainCreateInfo,
    buffers: Vec<GpuRenderTarget>,
    depth_stencil: Option<GpuRenderTarget>,
    order: SoftPresentOrder,
    cursor: usize,
    current: u32,
    presented: u64,
}

impl SoftSwapChain {
    /// Creates the back buffers described by `info`.
    pub fn new(gpu: Arc<SoftGpu>, info: &SwapChainCreateInfo) -> Result<Self, PresentError> {
        if info.width == 0 || info.height == 0 {
            return Err(PresentError::SwapChainCreationFailed(format!(
                "empty extent {}x{}",
                info.width, info.height
            )));
        }
        if info.format.is_depth_stencil() {
            return Err(PresentError::SwapChainCreationFailed(format!(
                "{:?} cannot be presented",
                info.format
            )));
        }
        let order = gpu.config().present_order.clone();
        let mut swap_chain = Self {
            gpu,
            info: *info,
            buffers: Vec::new(),
            depth_stencil: None,
            order,
            cursor: 0,
            current: 0,
            presented: 0,
        };
        swap_chain.create_buffers();
        log::debug!(
            "Soft swap chain {}x{} with {} buffers.",
            info.width,
            info.height,
            info.buffer_count
        );
        Ok(swap_chain)
    }

    fn target(&self, format: TextureFormat) -> GpuRenderTarget {
        let native = self.gpu.next_handle();
        GpuRenderTarget {
            texture: None,
            native,
            view: GpuDescriptorHandle(native.0),
            format,
            size: Extent3D::new_2d(self.info.width, self.info.height),
        }
    }

    fn create_buffers(&mut self) {
        self.buffers = (0..self.info.buffer_count)
            .map(|_| self.target(self.info.format))
            .collect();
        self.depth_stencil = self
            .info
            .depth_stencil_format
            .map(|format| self.target(format));
    }

    /// Frames presented so far.
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }
}

impl SwapChainBackend for SoftSwapChain {
    fn present(&mut self) -> bool {
        self.presented += 1;
        self.current = match &self.order {
            SoftPresentOrder::Scripted(script) if !script.is_empty() => {
                let index = script[self.cursor % script.len()];
                self.cursor += 1;
                index
            }
            _ => (self.current + 1) % self.info.buffer_count.max(1),
        };
        true
    }

    fn current_back_buffer_index(&self) -> u32 {
        self.current
    }

    fn buffer_count(&self) -> u32 {
        self.info.buffer_count
    }

    fn back_buffer(&self, index: u32) -> Option<GpuRenderTarget> {
        self.buffers.get(index as usize).cloned()
    }

    fn depth_stencil(&self) -> Option<GpuRenderTarget> {
        self.depth_stencil.clone()
    }

    fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.info.width = width;
        self.info.height = height;
        self.create_buffers();
        self.current = 0;
        self.cursor = 0;
        true
    }
}
