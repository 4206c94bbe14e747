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

use super::fence::GpuFence;
use super::swap_chain::SwapChainBackend;
use crate::command::CommandContext;
use crate::error::PresentError;
use crate::resource::{GpuNativeHandle, GpuRenderTarget, GpuResourceState};
use crate::settings::{MAX_FRAME_QUEUE_SIZE, MIN_FRAME_QUEUE_SIZE};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One slot of the frame ring.
#[derive(Debug, Clone)]
struct FrameResource {
    render_target: GpuRenderTarget,
    /// The fence value signaled after this frame was last presented.
    fence_value: u64,
}

/// Counters of a [`PresentationLayer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentationStats {
    /// Successful presents.
    pub presented_frames: u64,
    /// Presents that had to block on the fence.
    pub fence_waits: u64,
    /// The last value signaled on the frame fence.
    pub last_fence_value: u64,
    /// Size of the frame ring.
    pub frame_count: u32,
}

/// The swap chain frame ring of one output.
///
/// Each frame slot remembers the fence value signaled when it was last
/// presented. Before a slot is reused, [`present`](Self::present) blocks until
/// the GPU has passed that value, which bounds the CPU to `frame_count - 1`
/// frames ahead of the GPU.
pub struct PresentationLayer {
    swap_chain: Box<dyn SwapChainBackend>,
    fence: Arc<dyn GpuFence>,
    queue: GpuNativeHandle,
    frames: Vec<FrameResource>,
    depth_stencil: Option<GpuRenderTarget>,
    fence_value: u64,
    frame_index: u32,
    wait_timeout: Option<Duration>,
    stats: PresentationStats,
}

impl fmt::Debug for PresentationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationLayer")
            .field("queue", &self.queue)
            .field("frame_index", &self.frame_index)
            .field("fence_value", &self.fence_value)
            .field("stats", &self.stats)
            .finish()
    }
}

impl PresentationLayer {
    /// Builds the frame ring over `swap_chain`, signaling `fence` on the native
    /// queue `queue`.
    ///
    /// The swap chain must hold between [`MIN_FRAME_QUEUE_SIZE`] and
    /// [`MAX_FRAME_QUEUE_SIZE`] buffers.
    pub fn new(
        swap_chain: Box<dyn SwapChainBackend>,
        fence: Arc<dyn GpuFence>,
        queue: GpuNativeHandle,
        wait_timeout: Option<Duration>,
    ) -> Result<Self, PresentError> {
        let fence_value = fence.completed_value();
        let mut layer = Self {
            swap_chain,
            fence,
            queue,
            frames: Vec::new(),
            depth_stencil: None,
            fence_value,
            frame_index: 0,
            wait_timeout,
            stats: PresentationStats::default(),
        };
        layer.load_frame_resources()?;
        log::info!(
            "Presentation layer created with {} frames.",
            layer.frame_count()
        );
        Ok(layer)
    }

    /// Fetches the frame ring from the swap chain and installs it.
    ///
    /// The current ring is only replaced once the whole new ring, including
    /// its reported frame index, is valid.
    fn load_frame_resources(&mut self) -> Result<(), PresentError> {
        let count = self.swap_chain.buffer_count();
        if !(MIN_FRAME_QUEUE_SIZE..=MAX_FRAME_QUEUE_SIZE).contains(&count) {
            return Err(PresentError::SwapChainCreationFailed(format!(
                "{count} back buffers, expected {MIN_FRAME_QUEUE_SIZE} to {MAX_FRAME_QUEUE_SIZE}"
            )));
        }
        let frames = (0..count)
            .map(|index| {
                self.swap_chain
                    .back_buffer(index)
                    .map(|render_target| FrameResource {
                        render_target,
                        fence_value: self.fence_value,
                    })
                    .ok_or_else(|| {
                        PresentError::SwapChainCreationFailed(format!(
                            "back buffer {index} is unavailable"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let frame_index = self.read_frame_index(count)?;
        self.frames = frames;
        self.depth_stencil = self.swap_chain.depth_stencil();
        self.frame_index = frame_index;
        self.stats.frame_count = count;
        Ok(())
    }

    fn read_frame_index(&self, frame_count: u32) -> Result<u32, PresentError> {
        let index = self.swap_chain.current_back_buffer_index();
        if index >= frame_count {
            return Err(PresentError::InvalidFrameIndex { index, frame_count });
        }
        Ok(index)
    }

    /// Size of the frame ring.
    pub fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }

    /// The frame being recorded, as last reported by the swap chain.
    pub fn current_frame_index(&self) -> u32 {
        self.frame_index
    }

    /// The render target of the current frame.
    pub fn current_render_target(&self) -> Option<&GpuRenderTarget> {
        self.frames
            .get(self.frame_index as usize)
            .map(|frame| &frame.render_target)
    }

    fn current_frame_mut(&mut self) -> Result<&mut FrameResource, PresentError> {
        let frame_count = self.frame_count();
        let index = self.frame_index;
        self.frames
            .get_mut(index as usize)
            .ok_or(PresentError::InvalidFrameIndex { index, frame_count })
    }

    /// The depth-stencil target shared by all frames.
    pub fn depth_stencil(&self) -> Option<&GpuRenderTarget> {
        self.depth_stencil.as_ref()
    }

    /// The last value signaled on the frame fence.
    pub fn fence_value(&self) -> u64 {
        self.fence_value
    }

    /// Current counters.
    pub fn stats(&self) -> PresentationStats {
        PresentationStats {
            last_fence_value: self.fence_value,
            ..self.stats
        }
    }

    /// Transitions the current back buffer from present to render-target use
    /// and binds it, with the depth-stencil target, on `context`.
    pub fn bind_render_target(&self, context: &mut CommandContext) -> bool {
        let Some(target) = self.current_render_target() else {
            return false;
        };
        context.transition(
            target.native,
            GpuResourceState::Present,
            GpuResourceState::RenderTarget,
        ) && context.set_render_targets(std::slice::from_ref(target), self.depth_stencil.as_ref())
    }

    /// Transitions the current back buffer back to present use.
    pub fn invalidate_render_target(&self, context: &mut CommandContext) -> bool {
        let Some(target) = self.current_render_target() else {
            return false;
        };
        context.transition(
            target.native,
            GpuResourceState::RenderTarget,
            GpuResourceState::Present,
        )
    }

    fn signal_next(&mut self) -> Result<u64, PresentError> {
        let value = self.fence_value + 1;
        if !self.fence.signal_on_queue(self.queue, value) {
            return Err(PresentError::FenceSignalFailed(value));
        }
        self.fence_value = value;
        Ok(value)
    }

    fn wait_for_fence(&mut self, value: u64) -> Result<(), PresentError> {
        if self.fence.completed_value() >= value {
            return Ok(());
        }
        log::trace!("Waiting for frame fence value {}.", value);
        self.stats.fence_waits += 1;
        if !self.fence.wait_for_value(value, self.wait_timeout) {
            return Err(PresentError::FenceTimeout {
                value,
                completed: self.fence.completed_value(),
            });
        }
        Ok(())
    }

    /// Presents the current frame and advances to the next one.
    ///
    /// The frame just presented is tagged with a freshly signaled fence value.
    /// The next frame index is read back from the swap chain, then the call
    /// blocks until the GPU has finished the previous use of that frame.
    /// Returns the new frame index.
    ///
    /// On [`PresentError::FenceTimeout`] the ring has still advanced: the new
    /// frame is current but not yet safe to record into, see
    /// [`wait_for_current_frame`](Self::wait_for_current_frame).
    pub fn present(&mut self) -> Result<u32, PresentError> {
        self.current_frame_mut()?;
        if !self.swap_chain.present() {
            return Err(PresentError::PresentFailed);
        }
        let signaled = self.signal_next()?;
        self.current_frame_mut()?.fence_value = signaled;
        self.stats.presented_frames += 1;

        let next = self.read_frame_index(self.frame_count())?;
        self.frame_index = next;
        self.wait_for_current_frame()?;
        Ok(next)
    }

    /// Blocks until the GPU has finished the previous use of the current frame.
    pub fn wait_for_current_frame(&mut self) -> Result<(), PresentError> {
        let pending = self.current_frame_mut()?.fence_value;
        self.wait_for_fence(pending)
    }

    /// Blocks until all work submitted to the present queue has completed.
    pub fn wait_for_gpu_idle(&mut self) -> Result<(), PresentError> {
        let value = self.signal_next()?;
        self.wait_for_fence(value)
    }

    /// Waits for the GPU, resizes the swap chain and reloads the frame ring.
    ///
    /// On failure the previous ring stays in place.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), PresentError> {
        if width == 0 || height == 0 {
            return Err(PresentError::ResizeFailed { width, height });
        }
        self.wait_for_gpu_idle()?;
        if !self.swap_chain.resize(width, height) {
            return Err(PresentError::ResizeFailed { width, height });
        }
        self.load_frame_resources()?;
        log::debug!("Presentation layer resized to {}x{}.", width, height);
        Ok(())
    }
}

impl Drop for PresentationLayer {
    fn drop(&mut self) {
        if let Err(err) = self.wait_for_gpu_idle() {
            log::warn!("Presentation layer dropped while the GPU was busy: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Extent3D, GpuDescriptorHandle, TextureFormat};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct ScriptedSwapChain {
        count: u32,
        script: Vec<u32>,
        cursor: usize,
        resized_to: Option<(u32, u32)>,
        count_after_resize: Option<u32>,
        fail_resize: bool,
    }

    impl SwapChainBackend for ScriptedSwapChain {
        fn present(&mut self) -> bool {
            self.cursor += 1;
            true
        }
        fn current_back_buffer_index(&self) -> u32 {
            self.script[self.cursor % self.script.len()]
        }
        fn buffer_count(&self) -> u32 {
            self.count
        }
        fn back_buffer(&self, index: u32) -> Option<GpuRenderTarget> {
            (index < self.count).then(|| GpuRenderTarget {
                texture: None,
                native: GpuNativeHandle(0x100 + index as u64),
                view: GpuDescriptorHandle(0x200 + index as u64),
                format: TextureFormat::Bgra8Unorm,
                size: Extent3D::new_2d(64, 64),
            })
        }
        fn depth_stencil(&self) -> Option<GpuRenderTarget> {
            None
        }
        fn resize(&mut self, width: u32, height: u32) -> bool {
            if self.fail_resize {
                return false;
            }
            self.resized_to = Some((width, height));
            if let Some(count) = self.count_after_resize {
                self.count = count;
            }
            true
        }
    }

    /// Completes every signal immediately, or never when `stalled`.
    struct MockFence {
        completed: AtomicU64,
        stalled: bool,
        signals: Mutex<Vec<u64>>,
    }

    impl MockFence {
        fn new(stalled: bool) -> Arc<Self> {
            Arc::new(Self {
                completed: AtomicU64::new(0),
                stalled,
                signals: Mutex::new(Vec::new()),
            })
        }
    }

    impl GpuFence for MockFence {
        fn completed_value(&self) -> u64 {
            self.completed.load(Ordering::SeqCst)
        }
        fn signal_on_queue(&self, _queue: GpuNativeHandle, value: u64) -> bool {
            self.signals.lock().unwrap().push(value);
            if !self.stalled {
                self.completed.store(value, Ordering::SeqCst);
            }
            true
        }
        fn wait_for_value(&self, value: u64, _timeout: Option<Duration>) -> bool {
            self.completed_value() >= value
        }
    }

    fn layer(count: u32, script: Vec<u32>, fence: Arc<MockFence>) -> PresentationLayer {
        layer_over(
            ScriptedSwapChain {
                count,
                script,
                cursor: 0,
                resized_to: None,
                count_after_resize: None,
                fail_resize: false,
            },
            fence,
        )
    }

    fn layer_over(swap_chain: ScriptedSwapChain, fence: Arc<MockFence>) -> PresentationLayer {
        PresentationLayer::new(Box::new(swap_chain), fence, GpuNativeHandle(1), None).unwrap()
    }

    #[test]
    fn frame_index_is_read_back_from_the_swap_chain() {
        let script = vec![0, 2, 1, 1, 0, 2, 2];
        let mut layer = layer(3, script.clone(), MockFence::new(false));
        assert_eq!(layer.current_frame_index(), 0);
        for call in 1..=100usize {
            let index = layer.present().unwrap();
            assert!(index < 3);
            assert_eq!(index, script[call % script.len()]);
            assert_eq!(layer.current_frame_index(), index);
        }
        let stats = layer.stats();
        assert_eq!(stats.presented_frames, 100);
        assert_eq!(stats.last_fence_value, 100);
        assert_eq!(stats.fence_waits, 0);
    }

    #[test]
    fn fence_values_increase_monotonically() {
        let fence = MockFence::new(false);
        let mut layer = layer(2, vec![0, 1], fence.clone());
        for _ in 0..5 {
            layer.present().unwrap();
        }
        let signals = fence.signals.lock().unwrap().clone();
        assert_eq!(signals, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn reusing_a_busy_frame_times_out() {
        let mut layer = layer(2, vec![0, 1], MockFence::new(true));
        assert_eq!(layer.present(), Ok(1));
        assert_eq!(
            layer.present(),
            Err(PresentError::FenceTimeout {
                value: 1,
                completed: 0
            })
        );
        assert_eq!(layer.stats().fence_waits, 1);
        assert_eq!(layer.current_frame_index(), 0);
        assert!(layer.wait_for_current_frame().is_err());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut layer = layer(2, vec![0, 5], MockFence::new(false));
        assert_eq!(
            layer.present(),
            Err(PresentError::InvalidFrameIndex {
                index: 5,
                frame_count: 2
            })
        );
    }

    #[test]
    fn ring_size_outside_bounds_is_rejected() {
        let swap_chain = ScriptedSwapChain {
            count: 1,
            script: vec![0],
            cursor: 0,
            resized_to: None,
            count_after_resize: None,
            fail_resize: false,
        };
        let result = PresentationLayer::new(
            Box::new(swap_chain),
            MockFence::new(false),
            GpuNativeHandle(1),
            None,
        );
        assert!(matches!(result, Err(PresentError::SwapChainCreationFailed(_))));
    }

    #[test]
    fn resize_rejects_zero_extent_and_reloads_frames() {
        let mut layer = layer(2, vec![1, 0], MockFence::new(false));
        assert_eq!(
            layer.resize(0, 10),
            Err(PresentError::ResizeFailed {
                width: 0,
                height: 10
            })
        );
        layer.resize(320, 200).unwrap();
        assert_eq!(layer.frame_count(), 2);
        assert_eq!(layer.current_frame_index(), 1);
        assert_eq!(
            layer.current_render_target().map(|target| target.native),
            Some(GpuNativeHandle(0x101))
        );
    }

    #[test]
    fn failed_resize_keeps_the_previous_ring() {
        let mut layer = layer_over(
            ScriptedSwapChain {
                count: 2,
                script: vec![0, 1],
                cursor: 0,
                resized_to: None,
                count_after_resize: None,
                fail_resize: true,
            },
            MockFence::new(false),
        );
        assert_eq!(
            layer.resize(100, 100),
            Err(PresentError::ResizeFailed {
                width: 100,
                height: 100
            })
        );
        assert_eq!(layer.frame_count(), 2);
        assert!(layer.current_render_target().is_some());
        assert_eq!(layer.present(), Ok(1));
        assert!(layer.wait_for_current_frame().is_ok());
    }

    #[test]
    fn shrunk_ring_with_a_stale_index_is_not_installed() {
        let mut layer = layer_over(
            ScriptedSwapChain {
                count: 3,
                script: vec![2],
                cursor: 0,
                resized_to: None,
                count_after_resize: Some(2),
                fail_resize: false,
            },
            MockFence::new(false),
        );
        assert_eq!(layer.current_frame_index(), 2);
        assert_eq!(
            layer.resize(100, 100),
            Err(PresentError::InvalidFrameIndex {
                index: 2,
                frame_count: 2
            })
        );
        assert_eq!(layer.frame_count(), 3);
        assert_eq!(layer.current_frame_index(), 2);
        assert_eq!(layer.present(), Ok(2));
    }
}
