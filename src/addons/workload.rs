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

//! Composing the addons of a single workload, rooted at `copilot/<workload>/addons/`.

use crate::addons::io::WorkspaceReader;
use crate::addons::{compose, Stack};
use crate::error::Error;
use crate::parameters::WORKLOAD_RESERVED_PARAMETERS;
use crate::yaml::NodeIdGen;

/// Compose the CloudFormation addons declared for `workload_name`.
pub fn parse_from_workload(workspace: &impl WorkspaceReader, workload_name: &str, id_gen: &NodeIdGen) -> Result<Stack, Error> {
    let addons_dir = format!("copilot/{}/addons", workload_name);
    compose(workspace, &addons_dir, WORKLOAD_RESERVED_PARAMETERS, id_gen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addons::io::FilesystemWorkspace;

    #[test]
    fn fails_with_addons_not_found_when_the_workload_has_no_addons_directory() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = FilesystemWorkspace::new(dir.path());
        let ids = NodeIdGen::new();
        let error = parse_from_workload(&workspace, "web", &ids).unwrap_err();
        assert!(error.to_string().contains("no CloudFormation template fragments"));
    }

    #[test]
    fn composes_a_workloads_addons_directory() {
        let dir = tempfile::tempdir().unwrap();
        let addons_dir = dir.path().join("copilot/web/addons");
        std::fs::create_dir_all(&addons_dir).unwrap();
        std::fs::write(
            addons_dir.join("queue.yaml"),
            "Resources:\n  Queue:\n    Type: AWS::SQS::Queue\n\
             Parameters:\n  App:\n    Type: String\n  Env:\n    Type: String\n  Name:\n    Type: String\n",
        )
        .unwrap();

        let workspace = FilesystemWorkspace::new(dir.path());
        let ids = NodeIdGen::new();
        let stack = parse_from_workload(&workspace, "web", &ids).unwrap();
        assert!(stack.template().contains("Queue"));
    }
}
