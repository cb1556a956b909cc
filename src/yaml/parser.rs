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

//! Builds a [`Node`] tree out of a YAML document, tracking source positions as it goes.

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::error::Error;
use crate::yaml::node::{Node, NodeIdGen, Position, ScalarStyle};

/// Parse a single YAML document, attributing every node to `file_name`.
///
/// `id_gen` is shared across every file parsed during a single composition, so that node
/// identities never collide between fragments merged together afterwards.
pub fn parse(content: &str, file_name: &str, id_gen: &NodeIdGen) -> Result<Node, Error> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = Builder::new(content, file_name, id_gen);
    parser.load(&mut builder, false).map_err(Error::from)?;
    builder.into_result()
}

enum Frame {
    Sequence { start: Marker, items: Vec<Node>, flow: bool, anchor_id: usize, tag: Option<String> },
    Mapping { start: Marker, entries: Vec<(Node, Node)>, flow: bool, anchor_id: usize, tag: Option<String> },
}

struct Builder<'a> {
    source: &'a str,
    file_name: &'a str,
    id_gen: &'a NodeIdGen,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
    anchor_names: HashMap<usize, String>,
    root: Option<Node>,
    pending_key: Vec<Option<Node>>,
    error: Option<Error>,
}

impl<'a> Builder<'a> {
    fn new(source: &'a str, file_name: &'a str, id_gen: &'a NodeIdGen) -> Self {
        Builder {
            source,
            file_name,
            id_gen,
            stack: Vec::new(),
            anchors: HashMap::new(),
            anchor_names: HashMap::new(),
            root: None,
            pending_key: Vec::new(),
            error: None,
        }
    }

    fn into_result(self) -> Result<Node, Error> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.root.ok_or_else(|| Error::TemplateParseError {
            file: self.file_name.to_owned(),
            cause: "no YAML document found".to_owned(),
        })
    }

    fn position(&self, marker: &Marker) -> Position {
        Position {
            file: self.file_name.to_owned(),
            line: marker.line() + 1,
            column: marker.col() + 1,
        }
    }

    fn register_anchor(&mut self, anchor_id: usize, marker: &Marker, node: &Node) {
        if anchor_id == 0 {
            return;
        }
        self.anchors.insert(anchor_id, node.clone());
        if let Some(name) = find_anchor_name(self.source, marker) {
            node.set_anchor(name.clone());
            self.anchor_names.insert(anchor_id, name);
        }
    }

    fn complete(&mut self, node: Node) {
        // A completed mapping key waits for its value; a completed value (or a bare sequence
        // item / top-level document) is pushed straight into the enclosing collection.
        if let Some(slot) = self.pending_key.last_mut() {
            if slot.is_none() {
                *slot = Some(node);
                return;
            }
        }
        match self.stack.last_mut() {
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping { entries, .. }) => {
                let key = self.pending_key.pop().flatten().expect("mapping value without pending key");
                entries.push((key, node));
                self.pending_key.push(None);
            }
            None => self.root = Some(node),
        }
    }
}

impl<'a> MarkedEventReceiver for Builder<'a> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        match ev {
            Event::Nothing | Event::StreamStart | Event::StreamEnd | Event::DocumentStart | Event::DocumentEnd => {}

            Event::Scalar(value, style, anchor_id, tag) => {
                let tag = tag.map(|t| t.suffix);
                let position = self.position(&marker);
                let scalar_style = match style {
                    TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
                    TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
                    TScalarStyle::Literal => ScalarStyle::Literal,
                    TScalarStyle::Folded => ScalarStyle::Folded,
                    _ => ScalarStyle::Plain,
                };
                let node = Node::new_scalar(self.id_gen.next(), value, tag, scalar_style, position);
                self.register_anchor(anchor_id, &marker, &node);
                self.complete(node);
            }

            Event::SequenceStart(anchor_id, tag) => {
                self.stack.push(Frame::Sequence {
                    start: marker,
                    items: Vec::new(),
                    flow: false,
                    anchor_id,
                    tag: tag.map(|t| t.suffix),
                });
            }

            Event::SequenceEnd => match self.stack.pop() {
                Some(Frame::Sequence { start, items, flow, anchor_id, tag }) => {
                    let position = self.position(&start);
                    let node = Node::new_sequence(self.id_gen.next(), items, flow, tag, position);
                    self.register_anchor(anchor_id, &start, &node);
                    self.complete(node);
                }
                _ => self.error = Some(Error::TemplateParseError {
                    file: self.file_name.to_owned(),
                    cause: "sequence end without a matching start".to_owned(),
                }),
            },

            Event::MappingStart(anchor_id, tag) => {
                self.stack.push(Frame::Mapping {
                    start: marker,
                    entries: Vec::new(),
                    flow: false,
                    anchor_id,
                    tag: tag.map(|t| t.suffix),
                });
                self.pending_key.push(None);
            }

            Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Mapping { start, entries, flow, anchor_id, tag }) => {
                    self.pending_key.pop();
                    let position = self.position(&start);
                    let node = Node::new_mapping(self.id_gen.next(), entries, flow, tag, position);
                    self.register_anchor(anchor_id, &start, &node);
                    self.complete(node);
                }
                _ => self.error = Some(Error::TemplateParseError {
                    file: self.file_name.to_owned(),
                    cause: "mapping end without a matching start".to_owned(),
                }),
            },

            Event::Alias(anchor_id) => {
                let position = self.position(&marker);
                match self.anchors.get(&anchor_id).cloned() {
                    Some(target) => {
                        let name = self.anchor_names.get(&anchor_id).cloned();
                        let node = Node::new_alias(self.id_gen.next(), target, name, position);
                        self.complete(node);
                    }
                    None => {
                        self.error = Some(Error::TemplateParseError {
                            file: self.file_name.to_owned(),
                            cause: "alias references an anchor that was never defined".to_owned(),
                        });
                    }
                }
            }
        }
    }
}

/// Recover the textual name of an anchor (`&name`) immediately preceding `marker` in `source`.
///
/// `yaml-rust2` only exposes anchors as opaque numeric ids; this scans the raw text backwards to
/// recover the name for round-tripping, the same technique used to recover tag positions.
fn find_anchor_name(source: &str, marker: &Marker) -> Option<String> {
    let value_pos = marker.index();
    let window_start = value_pos.saturating_sub(64);
    if window_start > source.len() || value_pos > source.len() {
        return None;
    }
    let window = &source[window_start..value_pos];
    let amp_pos = window.rfind('&')?;
    let candidate = window[amp_pos + 1..].trim_end();
    if candidate.is_empty() || !candidate.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return None;
    }
    Some(candidate.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_mapping_with_positions() {
        let ids = NodeIdGen::new();
        let node = parse("Key: value\n", "test.yaml", &ids).unwrap();
        assert!(node.is_mapping());
        let value = node.mapping_lookup("Key").unwrap();
        assert_eq!(value.as_scalar_str().unwrap(), "value");
        assert_eq!(value.position().line, 1);
    }

    #[test]
    fn captures_cloudformation_intrinsic_tags() {
        let ids = NodeIdGen::new();
        let node = parse("Value: !Ref Foo\n", "test.yaml", &ids).unwrap();
        let value = node.mapping_lookup("Value").unwrap();
        assert_eq!(value.as_scalar_str().unwrap(), "Foo");
        assert_eq!(value.tag().as_deref(), Some("Ref"));
    }

    #[test]
    fn resolves_anchors_and_aliases_to_equal_content() {
        let ids = NodeIdGen::new();
        let node = parse("A: &shared\n  Foo: Bar\nB: *shared\n", "test.yaml", &ids).unwrap();
        let a = node.mapping_lookup("A").unwrap();
        let b = node.mapping_lookup("B").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_malformed_yaml() {
        let ids = NodeIdGen::new();
        let result = parse("Key: [unterminated\n", "broken.yaml", &ids);
        assert!(result.is_err());
    }
}
