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

//! Defines the hierarchy of error types for the GCI.
//!
//! Failures in this subsystem are "fail soft": creation calls hand back an `Err`
//! (the Rust rendition of a null handle) and validation predicates return `false`.
//! None of these errors is meant to drive control flow beyond "check before use".

use crate::command::GpuQueueId;
use crate::pipeline::PipelineStateDescriptorType;
use crate::root_signature::ShaderInputRefId;
use std::fmt;

/// An error produced while compiling a `RootSignatureDesc` into a `RootSignature`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSignatureError {
    /// More constant groups were declared than there are shader stage classes.
    TooManyConstantGroups {
        /// The number of groups declared.
        count: usize,
        /// The platform cap.
        max: usize,
    },
    /// A single constant group declared more constants than the platform cap.
    ConstantGroupTooLarge {
        /// The index of the offending group.
        group: usize,
        /// The number of constants declared in the group.
        count: usize,
        /// The platform cap.
        max: usize,
    },
    /// More descriptor sets were declared than the platform cap.
    TooManyDescriptorSets {
        /// The number of sets declared.
        count: usize,
        /// The platform cap.
        max: usize,
    },
    /// A single descriptor set declared more descriptors than the platform cap.
    DescriptorSetTooLarge {
        /// The index of the offending set.
        set: usize,
        /// The number of descriptors declared in the set.
        count: usize,
        /// The platform cap.
        max: usize,
    },
    /// The array sizes of a descriptor set add up to more slots than the platform cap.
    DescriptorSetTooManySlots {
        /// The index of the offending set.
        set: usize,
        /// The platform cap.
        max: u32,
    },
    /// The same constant ref id appears twice in the signature.
    DuplicateConstantRefId(ShaderInputRefId),
    /// The same descriptor ref id appears twice in the signature.
    DuplicateDescriptorRefId(ShaderInputRefId),
    /// A constant group or descriptor set has an access class that maps to no stage.
    EmptyStageVisibility {
        /// A short description of the offending element.
        element: String,
    },
    /// A descriptor carries binding info of the wrong kind for its type.
    DescriptorInfoMismatch(ShaderInputRefId),
}

impl fmt::Display for RootSignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootSignatureError::TooManyConstantGroups { count, max } => {
                write!(f, "Too many constant groups: {count} declared, max is {max}")
            }
            RootSignatureError::ConstantGroupTooLarge { group, count, max } => {
                write!(
                    f,
                    "Constant group {group} declares {count} constants, max is {max}"
                )
            }
            RootSignatureError::TooManyDescriptorSets { count, max } => {
                write!(f, "Too many descriptor sets: {count} declared, max is {max}")
            }
            RootSignatureError::DescriptorSetTooLarge { set, count, max } => {
                write!(
                    f,
                    "Descriptor set {set} declares {count} descriptors, max is {max}"
                )
            }
            RootSignatureError::DescriptorSetTooManySlots { set, max } => {
                write!(f, "Descriptor set {set} spans more than {max} slots")
            }
            RootSignatureError::DuplicateConstantRefId(id) => {
                write!(f, "Duplicate constant ref id {id:?} in root signature")
            }
            RootSignatureError::DuplicateDescriptorRefId(id) => {
                write!(f, "Duplicate descriptor ref id {id:?} in root signature")
            }
            RootSignatureError::EmptyStageVisibility { element } => {
                write!(f, "{element} is not visible to any shader stage")
            }
            RootSignatureError::DescriptorInfoMismatch(id) => {
                write!(f, "Descriptor {id:?} carries binding info that does not match its type")
            }
        }
    }
}

impl std::error::Error for RootSignatureError {}

/// An error related to the creation of an immutable pipeline state descriptor.
#[derive(Debug)]
pub enum PipelineError {
    /// The creation info could not be serialized into its canonical byte form.
    EncodingFailed(String),
    /// The create info failed validation before reaching the backend.
    InvalidCreateInfo {
        /// Which kind of descriptor was requested.
        descriptor_type: PipelineStateDescriptorType,
        /// Why the create info was rejected.
        details: String,
    },
    /// The root signature description could not be compiled.
    RootSignature(RootSignatureError),
    /// The backend failed to compile the native pipeline object.
    CompilationFailed {
        /// Which kind of descriptor was requested.
        descriptor_type: PipelineStateDescriptorType,
        /// A descriptive label, if available.
        label: Option<String>,
    },
    /// A shader referenced by a pipeline does not belong to the expected stage.
    ShaderStageMismatch {
        /// The label of the pipeline being created.
        pipeline_label: Option<String>,
        /// Details about the mismatch.
        details: String,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::EncodingFailed(msg) => {
                write!(f, "Pipeline create info encoding failed: {msg}")
            }
            PipelineError::InvalidCreateInfo {
                descriptor_type,
                details,
            } => {
                write!(f, "Invalid {descriptor_type:?} create info: {details}")
            }
            PipelineError::RootSignature(err) => {
                write!(f, "Root signature compilation failed: {err}")
            }
            PipelineError::CompilationFailed {
                descriptor_type,
                label,
            } => {
                write!(
                    f,
                    "Backend failed to compile {:?} '{}'",
                    descriptor_type,
                    label.as_deref().unwrap_or("Unknown")
                )
            }
            PipelineError::ShaderStageMismatch {
                pipeline_label,
                details,
            } => {
                write!(
                    f,
                    "Shader stage mismatch in pipeline '{}': {}",
                    pipeline_label.as_deref().unwrap_or("Unknown"),
                    details
                )
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::RootSignature(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RootSignatureError> for PipelineError {
    fn from(err: RootSignatureError) -> Self {
        PipelineError::RootSignature(err)
    }
}

/// An error related to the creation or use of a GPU resource (buffers, textures, etc.).
#[derive(Debug)]
pub enum ResourceError {
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// The create info was rejected by validation.
    InvalidCreateInfo(String),
    /// The memory pool backing the request has no room left.
    OutOfMemory {
        /// The name of the pool that was exhausted.
        pool: String,
        /// The number of bytes requested.
        requested: u64,
    },
    /// The native API failed to create the object.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds.
    OutOfBounds,
    /// The device has no command system yet.
    CommandSystemUnavailable,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::InvalidCreateInfo(msg) => {
                write!(f, "Invalid resource create info: {msg}")
            }
            ResourceError::OutOfMemory { pool, requested } => {
                write!(
                    f,
                    "Memory pool '{pool}' cannot satisfy a request of {requested} bytes"
                )
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::CommandSystemUnavailable => {
                write!(f, "The device command system is not initialized.")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

/// An error raised by the command system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The queue id is neither created nor aliased.
    UnknownQueue(GpuQueueId),
    /// The backend could not create a native command list or allocator.
    NativeListCreationFailed(String),
    /// The backend could not create a native queue.
    NativeQueueCreationFailed(GpuQueueId),
    /// The backend refused the submission.
    SubmissionFailed(GpuQueueId),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownQueue(id) => write!(f, "Unknown device queue {id:?}"),
            CommandError::NativeListCreationFailed(msg) => {
                write!(f, "Native command list creation failed: {msg}")
            }
            CommandError::NativeQueueCreationFailed(id) => {
                write!(f, "Native queue creation failed for {id:?}")
            }
            CommandError::SubmissionFailed(id) => {
                write!(f, "Command list submission to {id:?} failed")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// An error raised by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentError {
    /// The backend could not create the swap chain.
    SwapChainCreationFailed(String),
    /// The backend could not create the frame fence.
    FenceCreationFailed,
    /// The native present call failed.
    PresentFailed,
    /// The fence signal could not be enqueued.
    FenceSignalFailed(u64),
    /// The configured fence wait timeout elapsed before the GPU caught up.
    FenceTimeout {
        /// The fence value being waited for.
        value: u64,
        /// The completed value observed when the wait gave up.
        completed: u64,
    },
    /// The backend reported a frame index outside of the frame ring.
    InvalidFrameIndex {
        /// The reported index.
        index: u32,
        /// The frame ring size.
        frame_count: u32,
    },
    /// The swap chain could not be resized.
    ResizeFailed {
        /// The requested width.
        width: u32,
        /// The requested height.
        height: u32,
    },
    /// The present queue is unavailable.
    Command(CommandError),
}

impl fmt::Display for PresentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentError::SwapChainCreationFailed(msg) => {
                write!(f, "Swap chain creation failed: {msg}")
            }
            PresentError::FenceCreationFailed => write!(f, "Frame fence creation failed."),
            PresentError::PresentFailed => write!(f, "The native present call failed."),
            PresentError::FenceSignalFailed(value) => {
                write!(f, "Failed to signal frame fence with value {value}")
            }
            PresentError::FenceTimeout { value, completed } => {
                write!(
                    f,
                    "Timed out waiting for fence value {value} (completed: {completed})"
                )
            }
            PresentError::InvalidFrameIndex { index, frame_count } => {
                write!(
                    f,
                    "Backend reported frame index {index} outside of a ring of {frame_count}"
                )
            }
            PresentError::ResizeFailed { width, height } => {
                write!(f, "Swap chain resize to {width}x{height} failed")
            }
            PresentError::Command(err) => write!(f, "Present queue error: {err}"),
        }
    }
}

impl std::error::Error for PresentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PresentError::Command(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CommandError> for PresentError {
    fn from(err: CommandError) -> Self {
        PresentError::Command(err)
    }
}

/// A top-level error that can surface from any part of the GCI.
#[derive(Debug)]
pub enum GciError {
    /// The driver could not create a device.
    DeviceCreationFailed(String),
    /// An error occurred while managing a GPU resource.
    Resource(ResourceError),
    /// An error occurred in the command system.
    Command(CommandError),
    /// An error occurred while presenting.
    Present(PresentError),
}

impl fmt::Display for GciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GciError::DeviceCreationFailed(msg) => write!(f, "Device creation failed: {msg}"),
            GciError::Resource(err) => write!(f, "Graphics resource operation failed: {err}"),
            GciError::Command(err) => write!(f, "Command system failure: {err}"),
            GciError::Present(err) => write!(f, "Presentation failure: {err}"),
        }
    }
}

impl std::error::Error for GciError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GciError::Resource(err) => Some(err),
            GciError::Command(err) => Some(err),
            GciError::Present(err) => Some(err),
            GciError::DeviceCreationFailed(_) => None,
        }
    }
}

impl From<ResourceError> for GciError {
    fn from(err: ResourceError) -> Self {
        GciError::Resource(err)
    }
}

impl From<CommandError> for GciError {
    fn from(err: CommandError) -> Self {
        GciError::Command(err)
    }
}

impl From<PresentError> for GciError {
    fn from(err: PresentError) -> Self {
        GciError::Present(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn root_signature_error_display() {
        let err = RootSignatureError::DescriptorSetTooLarge {
            set: 1,
            count: 17,
            max: 16,
        };
        assert_eq!(
            format!("{err}"),
            "Descriptor set 1 declares 17 descriptors, max is 16"
        );
    }

    #[test]
    fn resource_error_wraps_pipeline_error() {
        let rs_err = RootSignatureError::DuplicateConstantRefId(ShaderInputRefId(7));
        let pso_err: PipelineError = rs_err.into();
        let res_err: ResourceError = pso_err.into();
        assert_eq!(
            format!("{res_err}"),
            "Pipeline resource error: Root signature compilation failed: Duplicate constant ref id ShaderInputRefId(7) in root signature"
        );
        assert!(res_err.source().is_some());
        assert!(res_err.source().unwrap().source().is_some());
    }

    #[test]
    fn gci_error_wraps_present_error() {
        let err: GciError = PresentError::FenceTimeout {
            value: 12,
            completed: 10,
        }
        .into();
        assert_eq!(
            format!("{err}"),
            "Presentation failure: Timed out waiting for fence value 12 (completed: 10)"
        );
        assert!(err.source().is_some());
    }
}
