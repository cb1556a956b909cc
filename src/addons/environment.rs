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

//! Composing an environment's addons, rooted at `copilot/environments/addons/`.

use crate::addons::io::WorkspaceReader;
use crate::addons::{compose, Stack};
use crate::error::Error;
use crate::parameters::ENVIRONMENT_RESERVED_PARAMETERS;
use crate::yaml::NodeIdGen;

const ADDONS_DIR: &str = "copilot/environments/addons";

/// Compose the CloudFormation addons shared across every environment.
pub fn parse_from_env(workspace: &impl WorkspaceReader, id_gen: &NodeIdGen) -> Result<Stack, Error> {
    compose(workspace, ADDONS_DIR, ENVIRONMENT_RESERVED_PARAMETERS, id_gen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addons::io::FilesystemWorkspace;

    #[test]
    fn composes_the_shared_environment_addons_directory() {
        let dir = tempfile::tempdir().unwrap();
        let addons_dir = dir.path().join(ADDONS_DIR);
        std::fs::create_dir_all(&addons_dir).unwrap();
        std::fs::write(
            addons_dir.join("vpc-endpoint.yaml"),
            "Resources:\n  Endpoint:\n    Type: AWS::EC2::VPCEndpoint\n\
             Parameters:\n  App:\n    Type: String\n  Env:\n    Type: String\n",
        )
        .unwrap();

        let workspace = FilesystemWorkspace::new(dir.path());
        let ids = NodeIdGen::new();
        let stack = parse_from_env(&workspace, &ids).unwrap();
        assert!(stack.template().contains("Endpoint"));
    }
}
