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

//! Canonical serialization of a [`Node`] tree back to YAML text.

use crate::yaml::node::{Node, ScalarStyle};

const INDENT_WIDTH: usize = 2;

/// Serialize `node` to YAML at the canonical indent width used throughout this crate.
///
/// The zero/sentinel Node serializes to an empty string, matching the "no section" case.
pub fn serialize(node: &Node) -> String {
    if node.is_zero() {
        return String::new();
    }
    let mut out = String::new();
    write_node(&mut out, node, 0, true);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn indent(out: &mut String, level: usize) {
    out.push_str(&" ".repeat(level * INDENT_WIDTH));
}

fn tag_prefix(node: &Node) -> String {
    match node.tag() {
        Some(tag) => format!("!{} ", tag),
        None => String::new(),
    }
}

fn write_node(out: &mut String, node: &Node, level: usize, at_line_start: bool) {
    let resolved = node.content();
    if is_alias(node) {
        if !at_line_start {
            out.push(' ');
        }
        out.push('*');
        out.push_str(&node.anchor().or_else(|| resolved.anchor()).unwrap_or_default());
        return;
    }
    if let Some(anchor) = node.anchor() {
        if !at_line_start {
            out.push(' ');
        }
        out.push('&');
        out.push_str(&anchor);
    }

    if resolved.is_scalar() {
        if !at_line_start {
            out.push(' ');
        }
        out.push_str(&tag_prefix(&resolved));
        out.push_str(&format_scalar(&resolved));
        return;
    }

    if resolved.is_sequence() {
        let items = resolved.sequence_items();
        if items.is_empty() {
            if !at_line_start {
                out.push(' ');
            }
            out.push_str(&tag_prefix(&resolved));
            out.push_str("[]");
            return;
        }
        if resolved.is_flow() {
            if !at_line_start {
                out.push(' ');
            }
            out.push_str(&tag_prefix(&resolved));
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_node(out, item, level, true);
            }
            out.push(']');
            return;
        }
        if !tag_prefix(&resolved).is_empty() {
            if !at_line_start {
                out.push(' ');
            }
            out.push_str(tag_prefix(&resolved).trim_end());
        }
        for item in items.iter() {
            out.push('\n');
            indent(out, level);
            out.push('-');
            // Scalars and nested block collections both nest one level under the `- ` marker.
            write_node(out, item, level + 1, false);
        }
        return;
    }

    if resolved.is_mapping() {
        let entries = resolved.mapping_entries();
        if entries.is_empty() {
            if !at_line_start {
                out.push(' ');
            }
            out.push_str(&tag_prefix(&resolved));
            out.push_str("{}");
            return;
        }
        if resolved.is_flow() {
            if !at_line_start {
                out.push(' ');
            }
            out.push_str(&tag_prefix(&resolved));
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_node(out, k, level, true);
                out.push_str(": ");
                write_node(out, v, level, true);
            }
            out.push('}');
            return;
        }
        for (i, (key, value)) in entries.iter().enumerate() {
            if !(i == 0 && at_line_start) {
                out.push('\n');
                indent(out, level);
            }
            write_node(out, key, level, true);
            out.push(':');
            let value_resolved = value.content();
            if value_resolved.is_zero() {
                continue;
            }
            if (value_resolved.is_mapping() && !value_resolved.mapping_entries().is_empty() && !value_resolved.is_flow())
                || (value_resolved.is_sequence() && !value_resolved.sequence_items().is_empty() && !value_resolved.is_flow())
            {
                write_node(out, value, level + 1, false);
            } else {
                write_node(out, value, level, false);
            }
        }
        return;
    }

    // Absent/zero value reached directly (e.g. an omitted section): nothing to emit.
}

fn is_alias(node: &Node) -> bool {
    // A Node is an alias iff resolving it through `content()` yields a different identity.
    node.id() != node.content().id()
}

fn format_scalar(node: &Node) -> String {
    let value = node.as_scalar_str().unwrap_or_default();
    match node.scalar_style() {
        ScalarStyle::Literal => format!("|\n{}", indent_block(&value)),
        ScalarStyle::Folded => format!(">\n{}", indent_block(&value)),
        ScalarStyle::SingleQuoted => format!("'{}'", value.replace('\'', "''")),
        ScalarStyle::DoubleQuoted => format!("\"{}\"", escape_double_quoted(&value)),
        ScalarStyle::Plain => {
            if needs_quoting(&value) {
                format!("\"{}\"", escape_double_quoted(&value))
            } else {
                value
            }
        }
    }
}

fn indent_block(value: &str) -> String {
    value
        .lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_double_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn needs_quoting(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    if matches!(lower.as_str(), "null" | "~" | "true" | "false" | "yes" | "no" | "on" | "off") {
        return true;
    }
    if value.parse::<i64>().is_ok() || value.parse::<f64>().is_ok() {
        return true;
    }
    if value.contains('\n') {
        return true;
    }
    if value.contains(": ") || value.ends_with(':') || value.contains(" #") {
        return true;
    }
    let first = value.chars().next().unwrap();
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) || first.is_whitespace() {
        return true;
    }
    if value.ends_with(' ') || value.starts_with(' ') {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::node::{NodeIdGen, Position};
    use crate::yaml::parser::parse;

    fn scalar(value: &str) -> Node {
        Node::synthetic_scalar(value)
    }

    #[test]
    fn empty_section_serializes_to_empty_string() {
        assert_eq!(serialize(&Node::zero()), "");
    }

    #[test]
    fn serializes_a_simple_mapping() {
        let mapping = Node::new_mapping(1, vec![(scalar("Key"), scalar("value"))], false, None, Position::synthetic());
        assert_eq!(serialize(&mapping), "Key: value\n");
    }

    #[test]
    fn quotes_scalars_that_would_otherwise_change_meaning() {
        let mapping = Node::new_mapping(1, vec![(scalar("Flag"), scalar("true"))], false, None, Position::synthetic());
        assert_eq!(serialize(&mapping), "Flag: \"true\"\n");
    }

    #[test]
    fn preserves_intrinsic_tags_round_trip() {
        let ids = NodeIdGen::new();
        let parsed = parse("Value: !Ref Foo\n", "test.yaml", &ids).unwrap();
        let out = serialize(&parsed);
        assert_eq!(out, "Value: !Ref Foo\n");
    }

    #[test]
    fn round_trips_nested_mappings_and_sequences() {
        let ids = NodeIdGen::new();
        let source = "Resources:\n  MyQueue:\n    Type: AWS::SQS::Queue\n    Properties:\n      Tags:\n        - Key: Name\n          Value: queue\n";
        let parsed = parse(source, "test.yaml", &ids).unwrap();
        let out = serialize(&parsed);
        assert!(out.contains("Resources:"));
        assert!(out.contains("- Key: Name"));
    }
}
