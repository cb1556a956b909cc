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

#![deny(missing_docs)]
#![deny(bare_trait_objects)]

//! # cfn-addons
//!
//! Composes a directory of user-authored CloudFormation template fragments ("addons") into a
//! single validated nested stack, and packages any local assets those fragments reference
//! (Lambda source directories, etc.) by zipping, hashing, and uploading them to S3.
//!
//! This is the library used internally by the `cfn-addons` binary. For further documentation on
//! how to use the binary, please check the respective documentation.

pub mod addons;
pub mod error;
pub mod package;
pub mod parameters;
pub mod provider;
pub mod template;
pub mod yaml;
