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

//! The table of CloudFormation resource types whose local assets get packaged (zipped, hashed,
//! and uploaded) before a template is handed off for deployment.
//!
//! Adding support for another packageable resource type is a matter of adding a row here, not
//! branching on the resource type anywhere in the traversal logic.

/// How to package a single property of a packageable resource type.
pub struct PackageRule {
    /// The property under `Properties` whose value is a local path to package.
    pub property: &'static str,
    /// The property to receive the uploaded object's bucket, and the property to receive its
    /// key, if the rule splits the two. `None` for a rule that instead overwrites `property`
    /// in place with a single URL.
    pub bucket_property: Option<&'static str>,
    /// See [`Self::bucket_property`].
    pub key_property: Option<&'static str>,
    /// Whether a directory input must be zipped before upload. A rule with `force_zip: false`
    /// instead allows a non-directory (single file) input, uploaded as-is.
    pub force_zip: bool,
}

const RULES: &[(&str, PackageRule)] = &[(
    "AWS::Lambda::Function",
    PackageRule {
        property: "Code",
        bucket_property: Some("S3Bucket"),
        key_property: Some("S3Key"),
        force_zip: true,
    },
)];

/// Look up the packaging rule for a CloudFormation resource type, if it's packageable.
pub fn lookup(resource_type: &str) -> Option<&'static PackageRule> {
    RULES.iter().find(|(ty, _)| *ty == resource_type).map(|(_, rule)| rule)
}
