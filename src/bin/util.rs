// Copyright 2025 TAKKT Industrial & Packaging GmbH
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
//
// SPDX-License-Identifier: Apache-2.0

use cfn_addons::error::Error;
use std::fs;
use std::path::Path;

/// Write `contents` to `path` if given, otherwise to stdout.
pub(crate) fn write_output(path: Option<&str>, contents: &str) -> Result<(), Error> {
    match path {
        Some(path) => fs::write(Path::new(path), contents).map_err(Into::into),
        None => {
            println!("{}", contents);
            Ok(())
        }
    }
}
