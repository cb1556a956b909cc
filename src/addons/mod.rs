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

//! The addons parser/merger: turns a directory of CloudFormation template fragments, plus an
//! optional parameters file, into a composed [`Stack`].

pub mod environment;
pub mod io;
pub mod workload;

use crate::error::Error;
use crate::parameters::{self, ParametersFile};
use crate::template::Template;
use crate::yaml::{serialize, Node, NodeIdGen};

use io::WorkspaceReader;

/// The result of composing a directory of addons: a merged template and (if one was present) the
/// validated parameters to hand to the deployment.
pub struct Stack {
    template: Template,
    parameters: Node,
}

impl Stack {
    /// The merged template, serialized at the canonical indent. Empty only if `Resources` (the
    /// one section a template can never omit) has no entries and nothing else was ever merged in,
    /// which in practice only happens via [`Template::empty`] directly, not through composition.
    pub fn template(&self) -> String {
        serialize(&self.template.document())
    }

    /// The validated parameters, serialized at the canonical indent. Empty if no parameters file
    /// was present.
    pub fn parameters(&self) -> String {
        serialize(&self.parameters)
    }

    /// The underlying template model, for callers (the asset packager) that need to rewrite
    /// `Resources` in place rather than work off the serialized text.
    pub fn template_mut(&mut self) -> &mut Template {
        &mut self.template
    }
}

fn has_yaml_extension(file_name: &str) -> bool {
    file_name.ends_with(".yaml") || file_name.ends_with(".yml")
}

/// Compose every CloudFormation template fragment and the (at most one) parameters file found in
/// `addons_dir`, validating the result against `reserved` before returning it.
///
/// This is the shared procedure behind both [`workload::parse_from_workload`] and
/// [`environment::parse_from_env`]; they differ only in `addons_dir` and `reserved`.
pub fn compose(
    workspace: &impl WorkspaceReader,
    addons_dir: &str,
    reserved: &[&str],
    id_gen: &NodeIdGen,
) -> Result<Stack, Error> {
    let entries = workspace
        .list(addons_dir)
        .map_err(|cause| Error::addons_not_found(Some(cause.to_string())))?;

    let yaml_files: Vec<String> = entries.into_iter().filter(|name| has_yaml_extension(name)).collect();
    if yaml_files.is_empty() {
        return Err(Error::addons_not_found(None));
    }

    let parameter_file_names: Vec<&String> = yaml_files.iter().filter(|name| parameters::is_parameters_file_name(name)).collect();
    if parameter_file_names.len() > 1 {
        return Err(Error::MultipleParameterFiles(format!(
            "only one parameters file is allowed, but both \"{}\" and \"{}\" are reserved names and present",
            parameters::PARAMETERS_FILE_NAMES[0],
            parameters::PARAMETERS_FILE_NAMES[1],
        )));
    }

    let template_file_names: Vec<&String> = yaml_files.iter().filter(|name| !parameters::is_parameters_file_name(name)).collect();
    if template_file_names.is_empty() {
        return Err(Error::addons_not_found(None));
    }

    let mut template = Template::empty();
    for file_name in &template_file_names {
        log::debug!("merging template fragment \"{}\"", file_name);
        let content = workspace.read(addons_dir, file_name)?;
        let text = String::from_utf8_lossy(&content).into_owned();
        let root = crate::yaml::parse(&text, file_name, id_gen)?;
        template.merge(&root, file_name)?;
    }

    let parameters_file = match parameter_file_names.first() {
        Some(file_name) => {
            log::debug!("reading parameters file \"{}\"", file_name);
            let content = workspace.read(addons_dir, file_name)?;
            let text = String::from_utf8_lossy(&content).into_owned();
            Some(ParametersFile::parse(&text, file_name, id_gen)?)
        }
        None => None,
    };

    let template_parameters = template.section("Parameters");
    let declared = parameters_file.as_ref().map(ParametersFile::parameters);
    parameters::validate(&template_parameters, declared.as_ref(), reserved)?;

    Ok(Stack {
        template,
        parameters: declared.unwrap_or_else(Node::zero),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryWorkspace {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryWorkspace {
        fn new(files: &[(&str, &str)]) -> MemoryWorkspace {
            let mut map = HashMap::new();
            for (path, contents) in files {
                map.insert((*path).to_owned(), contents.as_bytes().to_vec());
            }
            MemoryWorkspace { files: Mutex::new(map) }
        }
    }

    impl io::FileLister for MemoryWorkspace {
        fn list(&self, dir: &str) -> Result<Vec<String>, Error> {
            let prefix = format!("{}/", dir);
            let files = self.files.lock().unwrap();
            let mut names: Vec<String> = files
                .keys()
                .filter_map(|path| path.strip_prefix(&prefix))
                .filter(|rest| !rest.contains('/'))
                .map(str::to_owned)
                .collect();
            if names.is_empty() && !files.keys().any(|path| path.starts_with(&prefix)) {
                return Err(Error::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory")));
            }
            names.sort();
            Ok(names)
        }
    }

    impl io::FileReader for MemoryWorkspace {
        fn read(&self, dir: &str, file_name: &str) -> Result<Vec<u8>, Error> {
            let path = format!("{}/{}", dir, file_name);
            self.files
                .lock()
                .unwrap()
                .get(&path)
                .cloned()
                .ok_or_else(|| Error::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, path)))
        }
    }

    #[test]
    fn composes_two_fragments_and_a_parameters_file() {
        let workspace = MemoryWorkspace::new(&[
            (
                "addons/a.yaml",
                "Resources:\n  Bucket:\n    Type: AWS::S3::Bucket\n\
                 Parameters:\n  App:\n    Type: String\n  Env:\n    Type: String\n  Name:\n    Type: String\n",
            ),
            (
                "addons/addons.parameters.yaml",
                "Parameters:\n  App: my-app\n  Env: my-env\n  Name: my-name\n",
            ),
        ]);
        let ids = NodeIdGen::new();
        let stack = compose(&workspace, "addons", &[], &ids).unwrap();
        assert!(stack.template().contains("Bucket"));
        assert!(stack.parameters().contains("my-app"));
    }

    #[test]
    fn an_empty_directory_is_reported_as_addons_not_found() {
        let workspace = MemoryWorkspace::new(&[("addons/.gitkeep", "")]);
        let ids = NodeIdGen::new();
        let error = compose(&workspace, "addons", &[], &ids).unwrap_err();
        assert!(error.to_string().contains("no CloudFormation template fragments"));
    }

    #[test]
    fn two_parameters_files_are_rejected() {
        let workspace = MemoryWorkspace::new(&[
            ("addons/a.yaml", "Resources: {}\n"),
            ("addons/addons.parameters.yaml", "Parameters: {}\n"),
            ("addons/addons.parameters.yml", "Parameters: {}\n"),
        ]);
        let ids = NodeIdGen::new();
        let error = compose(&workspace, "addons", &[], &ids).unwrap_err();
        assert!(error.to_string().contains("only one parameters file"));
    }
}
