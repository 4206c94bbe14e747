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
//! Logger bootstrap for hosts.

use env_logger::{Builder, Env};

/// Installs an `env_logger` reading `RUST_LOG`, with `info` as the default level.
///
/// Returns `false` if a logger was already installed.
pub fn init() -> bool {
    init_with_filter("info")
}

/// Installs an `env_logger` reading `RUST_LOG`, with `default_filter` when the
/// variable is unset.
///
/// Calling it again is harmless: the first logger stays in place.
pub fn init_with_filter(default_filter: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        init_with_filter("debug");
        assert!(!init());
        log::debug!("still logging");
    }
}
