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

//! Parsing and validation of the addons parameters file.
//!
//! A parameters file is a YAML mapping with a single top-level `Parameters` key, supplying values
//! for parameters the composed template declares but that deployment tooling doesn't inject
//! itself (the reserved parameters, `App`/`Env`/`Name` or a subset of them).

use itertools::Itertools;

use crate::error::Error;
use crate::yaml::{Node, NodeIdGen};

/// The reserved parameter keys injected automatically when deploying a workload's addons.
pub const WORKLOAD_RESERVED_PARAMETERS: &[&str] = &["App", "Env", "Name"];

/// The reserved parameter keys injected automatically when deploying an environment's addons.
pub const ENVIRONMENT_RESERVED_PARAMETERS: &[&str] = &["App", "Env"];

/// The two recognized parameters-file names, keyed by YAML extension.
pub const PARAMETERS_FILE_NAMES: &[&str] = &["addons.parameters.yaml", "addons.parameters.yml"];

/// Whether `file_name` is one of the reserved parameters-file names.
pub fn is_parameters_file_name(file_name: &str) -> bool {
    PARAMETERS_FILE_NAMES.contains(&file_name)
}

/// A parsed, structurally validated parameters file.
pub struct ParametersFile {
    file_name: String,
    parameters: Node,
}

impl ParametersFile {
    /// Parse `content` (from `file_name`) as a parameters file.
    ///
    /// The file must be a mapping with exactly one top-level key, `Parameters`.
    pub fn parse(content: &str, file_name: &str, id_gen: &NodeIdGen) -> Result<ParametersFile, Error> {
        let root = crate::yaml::parse(content, file_name, id_gen)?;
        let entries = root.mapping_entries();
        let parameters = if root.is_mapping() && entries.len() == 1 {
            entries
                .into_iter()
                .find(|(key, _)| key.as_scalar_str().as_deref() == Some("Parameters"))
                .map(|(_, value)| value)
        } else {
            None
        };

        match parameters {
            Some(parameters) if !parameters.is_zero() => Ok(ParametersFile {
                file_name: file_name.to_owned(),
                parameters,
            }),
            _ => Err(Error::MissingParametersField(format!(
                "parameters file \"{}\" must be a mapping with a single top-level \"Parameters\" key",
                file_name
            ))),
        }
    }

    /// The parsed `Parameters` mapping (logical ID -> value).
    pub fn parameters(&self) -> Node {
        self.parameters.clone()
    }

    /// The file this was parsed from.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Validate that a composed template's `Parameters` section, together with an optional parameters
/// file, satisfies the reserved-parameter invariants.
///
/// `template_parameters` is the merged template's `Parameters` section (possibly the zero node).
/// `declared` is the parsed parameters file's `Parameters` mapping, if a parameters file was
/// present. `reserved` is the reserved key set for the calling context (workload or environment).
///
/// Rules are checked in order; the first violation, by key in canonical declared order, is
/// reported. See each branch below for the corresponding rule.
pub fn validate(template_parameters: &Node, declared: Option<&Node>, reserved: &[&str]) -> Result<(), Error> {
    // Rule 1: every reserved key must be declared by the template itself.
    for &key in reserved {
        if template_parameters.mapping_lookup(key).is_none() {
            return Err(Error::MissingRequiredReservedParameter(format!(
                "required parameter \"{}\" is missing from the template",
                key
            )));
        }
    }

    // Rule 2: the parameters file must not attempt to supply a reserved key itself.
    if let Some(declared) = declared {
        let any_reserved_declared = reserved.iter().any(|&key| declared.mapping_lookup(key).is_some());
        if any_reserved_declared {
            return Err(Error::ReservedParameterDeclared(format!(
                "reserved parameters {} cannot be declared",
                word_series(reserved)
            )));
        }
    }

    // Rule 3: every key in the parameters file must correspond to a template-declared parameter.
    if let Some(declared) = declared {
        for (key, _) in declared.mapping_entries() {
            let key_str = key.as_scalar_str().unwrap_or_default();
            if template_parameters.mapping_lookup(&key_str).is_none() {
                return Err(Error::ExtraParameter(format!(
                    "template does not require the parameter \"{}\" in parameters file",
                    key_str
                )));
            }
        }
    }

    // Rule 4: every non-reserved, non-defaulted template parameter must be supplied a value.
    for (key, definition) in template_parameters.mapping_entries() {
        let key_str = key.as_scalar_str().unwrap_or_default();
        if reserved.contains(&key_str.as_str()) {
            continue;
        }
        let has_default = definition.mapping_lookup("Default").map(|d| !d.is_zero()).unwrap_or(false);
        let supplied = declared.map(|d| d.mapping_lookup(&key_str).is_some()).unwrap_or(false);
        if !has_default && !supplied {
            return Err(Error::MissingParameterForNoDefault(format!(
                "parameter \"{}\" in template must have a default value or is included in parameters file",
                key_str
            )));
        }
    }

    Ok(())
}

/// Join `items` the way standard English lists a series: `"a", "b" and "c"`.
fn word_series(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("\"{}\"", item)).collect();
    match quoted.len() {
        0 => String::new(),
        1 => quoted[0].clone(),
        _ => {
            let (last, rest) = quoted.split_last().expect("checked non-empty above");
            format!("{} and {}", rest.iter().join(", "), last)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::NodeIdGen;

    #[test]
    fn word_series_joins_three_items_with_oxford_and() {
        assert_eq!(word_series(&["App", "Env", "Name"]), "\"App\", \"Env\" and \"Name\"");
    }

    #[test]
    fn word_series_handles_two_items() {
        assert_eq!(word_series(&["App", "Env"]), "\"App\" and \"Env\"");
    }

    #[test]
    fn parses_a_well_formed_parameters_file() {
        let ids = NodeIdGen::new();
        let file = ParametersFile::parse("Parameters:\n  BucketName: my-bucket\n", "addons.parameters.yaml", &ids).unwrap();
        assert_eq!(file.parameters().mapping_lookup("BucketName").unwrap().as_scalar_str().unwrap(), "my-bucket");
    }

    #[test]
    fn rejects_a_parameters_file_without_the_parameters_key() {
        let ids = NodeIdGen::new();
        let result = ParametersFile::parse("Foo: Bar\n", "addons.parameters.yaml", &ids);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_a_parameters_file_with_extra_top_level_keys() {
        let ids = NodeIdGen::new();
        let result = ParametersFile::parse("Parameters:\n  Foo: Bar\nExtra: 1\n", "addons.parameters.yaml", &ids);
        assert!(result.is_err());
    }

    #[test]
    fn rule_one_reports_a_missing_reserved_parameter() {
        let ids = NodeIdGen::new();
        let template_parameters = crate::yaml::parse("App:\n  Type: String\n", "template.yaml", &ids).unwrap();
        let error = validate(&template_parameters, None, WORKLOAD_RESERVED_PARAMETERS).unwrap_err();
        assert_eq!(
            error.to_string(),
            "required parameter \"Env\" is missing from the template"
        );
    }

    #[test]
    fn rule_two_rejects_a_reserved_parameter_declared_in_the_file() {
        let ids = NodeIdGen::new();
        let template_parameters = crate::yaml::parse(
            "App:\n  Type: String\nEnv:\n  Type: String\nName:\n  Type: String\n",
            "template.yaml",
            &ids,
        )
        .unwrap();
        let declared = crate::yaml::parse("App: my-app\n", "addons.parameters.yaml", &ids).unwrap();
        let error = validate(&template_parameters, Some(&declared), WORKLOAD_RESERVED_PARAMETERS).unwrap_err();
        assert_eq!(
            error.to_string(),
            "reserved parameters \"App\", \"Env\" and \"Name\" cannot be declared"
        );
    }

    #[test]
    fn rule_three_rejects_an_unknown_parameter_in_the_file() {
        let ids = NodeIdGen::new();
        let template_parameters = crate::yaml::parse(
            "App:\n  Type: String\nEnv:\n  Type: String\n",
            "template.yaml",
            &ids,
        )
        .unwrap();
        let declared = crate::yaml::parse("Bogus: 1\n", "addons.parameters.yaml", &ids).unwrap();
        let error = validate(&template_parameters, Some(&declared), ENVIRONMENT_RESERVED_PARAMETERS).unwrap_err();
        assert_eq!(
            error.to_string(),
            "template does not require the parameter \"Bogus\" in parameters file"
        );
    }

    #[test]
    fn rule_four_requires_a_default_or_a_supplied_value() {
        let ids = NodeIdGen::new();
        let template_parameters = crate::yaml::parse(
            "App:\n  Type: String\nEnv:\n  Type: String\nBucketName:\n  Type: String\n",
            "template.yaml",
            &ids,
        )
        .unwrap();
        let error = validate(&template_parameters, None, ENVIRONMENT_RESERVED_PARAMETERS).unwrap_err();
        assert_eq!(
            error.to_string(),
            "parameter \"BucketName\" in template must have a default value or is included in parameters file"
        );
    }

    #[test]
    fn a_parameter_with_a_default_does_not_need_to_be_supplied() {
        let ids = NodeIdGen::new();
        let template_parameters = crate::yaml::parse(
            "App:\n  Type: String\nEnv:\n  Type: String\nBucketName:\n  Type: String\n  Default: my-bucket\n",
            "template.yaml",
            &ids,
        )
        .unwrap();
        assert!(validate(&template_parameters, None, ENVIRONMENT_RESERVED_PARAMETERS).is_ok());
    }
}
