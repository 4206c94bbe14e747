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

//! # GCI Core
//!
//! Backend-agnostic GPU command and resource interface.
//!
//! This crate defines the "common language" that rendering code uses to create
//! buffers, textures, pipeline state and command streams without depending on
//! the native graphics API that is actually present. It also carries the generic
//! machinery shared by every backend: memory accounting, resource lifetime
//! tracking, the root signature compiler, the pipeline state cache, command
//! context pooling and the presentation frame ring.
//!
//! The 'how' of a given native API lives behind the hook traits in
//! [`driver::backend`], implemented once per backend (see the `gci-infra` crate).

#![warn(missing_docs)]

pub mod command;
pub mod driver;
pub mod error;
pub mod event;
pub mod memory;
pub mod pipeline;
pub mod presentation;
pub mod resource;
pub mod root_signature;
pub mod settings;

pub use driver::{null_driver, GpuDevice, GpuDriver};
pub use error::{
    CommandError, GciError, PipelineError, PresentError, ResourceError, RootSignatureError,
};
pub use settings::{GciSettings, GpuDriverConfigFlags};
