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

//! The CloudFormation Template Model: a composed template held in memory as a tree of
//! [`Node`](crate::yaml::Node)s, with a section-by-section merge policy and an origin index that
//! remembers which fragment file contributed each piece of it.

use std::collections::HashMap;

use crate::error::Error;
use crate::yaml::{Node, NodeId};

/// The seven fixed top-level sections of a composed template, in the order CloudFormation
/// documents conventionally list them.
pub const SECTIONS: &[&str] = &[
    "Metadata",
    "Parameters",
    "Mappings",
    "Conditions",
    "Transform",
    "Resources",
    "Outputs",
];

/// How a section is merged when a second fragment also defines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeStyle {
    /// A flat `key -> value` mapping; entries are merged by key, equal values absorbed silently.
    FlatMap,
    /// A `outer -> inner -> value` mapping (`Mappings`); merged one level down.
    NestedMap,
    /// A deduplicated, order-irrelevant set of scalars (`Transform`).
    ScalarSet,
}

fn merge_style(section: &str) -> MergeStyle {
    match section {
        "Mappings" => MergeStyle::NestedMap,
        "Transform" => MergeStyle::ScalarSet,
        _ => MergeStyle::FlatMap,
    }
}

/// The noun used in a conflict message for a given section, e.g. `"metadata key"`.
fn conflict_noun(section: &str) -> &'static str {
    match section {
        "Metadata" => "metadata key",
        "Parameters" => "parameter logical ID",
        "Mappings" => "mapping",
        "Conditions" => "condition",
        "Resources" => "resource",
        "Outputs" => "output",
        other => unreachable!("section {} has no merge conflicts", other),
    }
}

/// A composed CloudFormation template, plus the index of which fragment file contributed each
/// node reachable from it.
///
/// `Resources` is always present, even if empty, since CloudFormation requires it; every other
/// section is omitted entirely (its Node stays the zero/sentinel node) when no fragment defined it.
pub struct Template {
    sections: HashMap<&'static str, Node>,
    origin: HashMap<NodeId, String>,
}

impl Template {
    /// An empty template: every section absent except `Resources`, which starts as an empty
    /// mapping (CloudFormation never omits it).
    pub fn empty() -> Template {
        let mut sections = HashMap::new();
        for &section in SECTIONS {
            sections.insert(section, Node::zero());
        }
        sections.insert("Resources", Node::synthetic_mapping());
        Template {
            sections,
            origin: HashMap::new(),
        }
    }

    /// The Node held for a given section, or the zero node if that section is absent.
    pub fn section(&self, name: &str) -> Node {
        self.sections.get(name).cloned().unwrap_or_else(Node::zero)
    }

    /// Assemble the whole template as a single mapping Node, in canonical section order, omitting
    /// every absent section except `Resources`.
    pub fn document(&self) -> Node {
        let entries: Vec<(Node, Node)> = SECTIONS
            .iter()
            .filter_map(|&section| {
                let node = self.section(section);
                if node.is_zero() {
                    None
                } else {
                    Some((Node::synthetic_scalar(section), node))
                }
            })
            .collect();
        Node::new_mapping(0, entries, false, None, crate::yaml::Position::synthetic())
    }

    /// The file that contributed `node`, if it came from merging a fragment rather than being
    /// synthesized by the engine itself.
    pub fn origin_of(&self, node: &Node) -> Option<&str> {
        self.origin.get(&node.id()).map(String::as_str)
    }

    /// Merge a freshly parsed fragment (`root`, from `file_name`) into this template.
    ///
    /// Every section the fragment defines is merged according to its [`MergeStyle`]; a fragment
    /// may define a subset of the seven sections, or none at all (the merge is then a no-op).
    /// Unrecognized top-level keys in the fragment are ignored, matching the spec's sparse view of
    /// a "CloudFormation template" as just these seven sections.
    pub fn merge(&mut self, root: &Node, file_name: &str) -> Result<(), Error> {
        if root.is_zero() {
            return Ok(());
        }
        for &section in SECTIONS {
            let incoming = match root.mapping_lookup(section) {
                Some(incoming) => incoming,
                None => continue,
            };
            if incoming.is_zero() {
                continue;
            }
            self.merge_section(section, &incoming, file_name)?;
        }
        Ok(())
    }

    fn merge_section(&mut self, section: &'static str, incoming: &Node, file_name: &str) -> Result<(), Error> {
        let existing = self.sections.get(section).cloned().unwrap_or_else(Node::zero);
        if existing.is_zero() {
            let stored = if merge_style(section) == MergeStyle::ScalarSet && !incoming.is_sequence() {
                let wrapped = Node::new_sequence(0, vec![incoming.clone()], false, None, incoming.position());
                self.stamp_origin(incoming, file_name);
                wrapped
            } else {
                self.stamp_origin(incoming, file_name);
                incoming.clone()
            };
            self.sections.insert(section, stored);
            return Ok(());
        }

        match merge_style(section) {
            MergeStyle::FlatMap => self.merge_flat_map(section, &existing, incoming, file_name),
            MergeStyle::NestedMap => self.merge_nested_map(section, &existing, incoming, file_name),
            MergeStyle::ScalarSet => {
                self.merge_scalar_set(&existing, incoming, file_name);
                Ok(())
            }
        }
    }

    fn merge_flat_map(&mut self, section: &'static str, dest: &Node, incoming: &Node, file_name: &str) -> Result<(), Error> {
        for (key, value) in incoming.mapping_entries() {
            let key_str = key.as_scalar_str().unwrap_or_default();
            match dest.mapping_lookup(&key_str) {
                None => {
                    dest.push_mapping_entry(key.clone(), value.clone());
                    self.stamp_origin(&key, file_name);
                    self.stamp_origin(&value, file_name);
                }
                Some(existing_value) => {
                    if existing_value == value {
                        continue;
                    }
                    return Err(self.conflict_error(section, &key_str, &existing_value, &value, file_name));
                }
            }
        }
        Ok(())
    }

    fn merge_nested_map(&mut self, section: &'static str, dest: &Node, incoming: &Node, file_name: &str) -> Result<(), Error> {
        for (outer_key, inner_incoming) in incoming.mapping_entries() {
            let outer_str = outer_key.as_scalar_str().unwrap_or_default();
            match dest.mapping_lookup(&outer_str) {
                None => {
                    dest.push_mapping_entry(outer_key.clone(), inner_incoming.clone());
                    self.stamp_origin(&outer_key, file_name);
                    self.stamp_origin(&inner_incoming, file_name);
                }
                Some(inner_existing) => {
                    for (inner_key, value) in inner_incoming.mapping_entries() {
                        let inner_str = inner_key.as_scalar_str().unwrap_or_default();
                        match inner_existing.mapping_lookup(&inner_str) {
                            None => {
                                inner_existing.push_mapping_entry(inner_key.clone(), value.clone());
                                self.stamp_origin(&inner_key, file_name);
                                self.stamp_origin(&value, file_name);
                            }
                            Some(existing_value) => {
                                if existing_value == value {
                                    continue;
                                }
                                let combined_key = format!("{}.{}", outer_str, inner_str);
                                return Err(self.conflict_error(section, &combined_key, &existing_value, &value, file_name));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn merge_scalar_set(&mut self, dest: &Node, incoming: &Node, file_name: &str) {
        let incoming_elements = if incoming.is_sequence() {
            incoming.sequence_items()
        } else {
            vec![incoming.clone()]
        };
        for element in incoming_elements {
            let already_present = dest.sequence_items().iter().any(|existing| existing == &element);
            if already_present {
                continue;
            }
            dest.push_sequence_item(element.clone());
            self.stamp_origin(&element, file_name);
        }
    }

    fn conflict_error(&self, section: &'static str, key: &str, existing: &Node, incoming: &Node, incoming_file: &str) -> Error {
        let existing_file = self.origin_of(existing).unwrap_or("").to_owned();
        let existing_position = crate::yaml::Position {
            file: existing_file,
            ..existing.position()
        };
        let incoming_position = crate::yaml::Position {
            file: incoming_file.to_owned(),
            ..incoming.position()
        };
        Error::SectionConflict(format!(
            "{noun} \"{key}\" defined in {a} is different than in {b}",
            noun = conflict_noun(section),
            key = key,
            a = existing_position,
            b = incoming_position,
        ))
    }

    /// Stamp `node` and every descendant not already stamped with `file_name`, so conflict
    /// messages can later say which fragment first defined a given piece of the template.
    fn stamp_origin(&mut self, node: &Node, file_name: &str) {
        let mut stack = vec![node.clone()];
        while let Some(current) = stack.pop() {
            if self.origin.contains_key(&current.id()) {
                continue;
            }
            self.origin.insert(current.id(), file_name.to_owned());
            stack.extend(current.children());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::{parse, NodeIdGen};

    fn parse_fragment(ids: &NodeIdGen, source: &str, file_name: &str) -> Node {
        parse(source, file_name, ids).unwrap()
    }

    #[test]
    fn merging_disjoint_resources_is_commutative() {
        let ids = NodeIdGen::new();
        let a = parse_fragment(&ids, "Resources:\n  Bucket:\n    Type: AWS::S3::Bucket\n", "a.yaml");
        let b = parse_fragment(&ids, "Resources:\n  Queue:\n    Type: AWS::SQS::Queue\n", "b.yaml");

        let mut forward = Template::empty();
        forward.merge(&a, "a.yaml").unwrap();
        forward.merge(&b, "b.yaml").unwrap();

        let mut backward = Template::empty();
        backward.merge(&b, "b.yaml").unwrap();
        backward.merge(&a, "a.yaml").unwrap();

        assert!(forward.section("Resources").mapping_lookup("Bucket").is_some());
        assert!(forward.section("Resources").mapping_lookup("Queue").is_some());
        assert!(backward.section("Resources").mapping_lookup("Bucket").is_some());
        assert!(backward.section("Resources").mapping_lookup("Queue").is_some());
    }

    #[test]
    fn identical_redefinitions_are_absorbed_without_conflict() {
        let ids = NodeIdGen::new();
        let a = parse_fragment(&ids, "Metadata:\n  Foo: Bar\n", "a.yaml");
        let b = parse_fragment(&ids, "Metadata:\n  Foo: Bar\n", "b.yaml");

        let mut template = Template::empty();
        template.merge(&a, "a.yaml").unwrap();
        template.merge(&b, "b.yaml").unwrap();

        assert_eq!(
            template.section("Metadata").mapping_lookup("Foo").unwrap().as_scalar_str().unwrap(),
            "Bar"
        );
    }

    #[test]
    fn conflicting_metadata_reports_both_locations() {
        let ids = NodeIdGen::new();
        let a = parse_fragment(&ids, "Metadata:\n  Foo: Bar\n", "first.yaml");
        let b = parse_fragment(&ids, "Metadata:\n  Foo: Baz\n", "second.yaml");

        let mut template = Template::empty();
        template.merge(&a, "first.yaml").unwrap();
        let error = template.merge(&b, "second.yaml").unwrap_err();

        let message = error.to_string();
        assert!(message.contains("metadata key \"Foo\""));
        assert!(message.contains("first.yaml"));
        assert!(message.contains("second.yaml"));
    }

    #[test]
    fn mapping_conflicts_report_the_dotted_key() {
        let ids = NodeIdGen::new();
        let a = parse_fragment(&ids, "Mappings:\n  RegionMap:\n    eu-west-1:\n      AMI: ami-1\n", "first.yaml");
        let b = parse_fragment(&ids, "Mappings:\n  RegionMap:\n    eu-west-1:\n      AMI: ami-2\n", "second.yaml");

        let mut template = Template::empty();
        template.merge(&a, "first.yaml").unwrap();
        let error = template.merge(&b, "second.yaml").unwrap_err();

        assert!(error.to_string().contains("mapping \"RegionMap.eu-west-1\""));
    }

    #[test]
    fn transform_deduplicates_scalar_and_sequence_forms() {
        let ids = NodeIdGen::new();
        let a = parse_fragment(&ids, "Transform: Foo\n", "a.yaml");
        let b = parse_fragment(&ids, "Transform: [Foo, Bar]\n", "b.yaml");

        let mut template = Template::empty();
        template.merge(&a, "a.yaml").unwrap();
        template.merge(&b, "b.yaml").unwrap();

        let items = template.section("Transform").sequence_items();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn resources_section_is_present_even_when_empty() {
        let template = Template::empty();
        assert!(!template.section("Resources").is_zero());
        assert!(template.section("Resources").mapping_entries().is_empty());
        assert!(template.section("Metadata").is_zero());
    }
}
