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

//! The asset packager: walks a composed template's `Resources`, zips and uploads the local
//! assets of packageable resources, and rewrites their properties to point at the uploaded
//! location.

pub mod registry;
pub mod uploader;
pub mod zip;

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::template::Template;
use crate::yaml::{Node, Position};

use registry::PackageRule;
use uploader::Uploader;

/// Package every packageable resource in `template`'s `Resources` section.
///
/// `workspace_root` resolves relative asset paths; `bucket` is where assets are uploaded;
/// `artifact_key_path` derives the (opaque, stable) upload key from the workload name and an
/// asset's content hash. Resources whose type isn't in the [`registry`], or whose packageable
/// property already points at a remote location, are left untouched.
pub async fn package_resources(
    template: &Template,
    workspace_root: &Path,
    workload_name: &str,
    bucket: &str,
    uploader: &(impl Uploader + Sync),
    artifact_key_path: impl Fn(&str, &str) -> String,
) -> Result<(), Error> {
    let resources = template.section("Resources");
    for (name, resource) in resources.mapping_entries() {
        let resource_name = name.as_scalar_str().unwrap_or_default();

        let resource_type = match resource.mapping_lookup("Type").and_then(|t| t.as_scalar_str()) {
            Some(resource_type) => resource_type,
            None => continue,
        };
        let rule = match registry::lookup(&resource_type) {
            Some(rule) => rule,
            None => continue,
        };
        let properties = match resource.mapping_lookup("Properties") {
            Some(properties) if properties.is_mapping() => properties,
            _ => continue,
        };
        let path_str = match properties.mapping_lookup(rule.property).and_then(|value| value.as_scalar_str()) {
            Some(path_str) => path_str,
            None => continue,
        };

        let rewrite = package_one(&path_str, workspace_root, bucket, uploader, &artifact_key_path, workload_name, rule)
            .await
            .map_err(|cause| {
                Error::PackageError(format!(
                    "transform property {} property {}: {}",
                    resource_name, rule.property, cause
                ))
            })?;

        if let Some(rewrite) = rewrite {
            apply_rewrite(&properties, rule, rewrite);
        }
    }
    Ok(())
}

enum Rewrite {
    SingleUrl(String),
    BucketAndKey(String, String),
}

async fn package_one(
    path_str: &str,
    workspace_root: &Path,
    bucket: &str,
    uploader: &(impl Uploader + Sync),
    artifact_key_path: &impl Fn(&str, &str) -> String,
    workload_name: &str,
    rule: &PackageRule,
) -> Result<Option<Rewrite>, String> {
    if is_remote(path_str) {
        return Ok(None);
    }

    let local_path = resolve_local_path(path_str, workspace_root);
    let zipped = if local_path.is_dir() {
        zip::zip_directory(&local_path).map_err(|cause| cause.to_string())?
    } else if rule.force_zip {
        return Err("packaging a single file is not supported, only directories".to_owned());
    } else {
        zip::read_file(&local_path).map_err(|cause| cause.to_string())?
    };
    let key = artifact_key_path(workload_name, &zipped.hash_hex);
    let url = uploader.upload(bucket, &key, zipped.bytes).await.map_err(|cause| cause.to_string())?;
    log::info!("packaged asset \"{}\" to \"{}\"", local_path.display(), url);
    let (parsed_bucket, parsed_key) =
        uploader::parse_object_url(&url).ok_or_else(|| format!("uploader returned an unparseable URL: {}", url))?;

    if rule.bucket_property.is_some() && rule.key_property.is_some() {
        Ok(Some(Rewrite::BucketAndKey(parsed_bucket, parsed_key)))
    } else {
        Ok(Some(Rewrite::SingleUrl(format!("s3://{}/{}", parsed_bucket, parsed_key))))
    }
}

fn apply_rewrite(properties: &Node, rule: &PackageRule, rewrite: Rewrite) {
    match (rewrite, rule.bucket_property, rule.key_property) {
        (Rewrite::BucketAndKey(bucket, key), Some(bucket_property), Some(key_property)) => {
            let mapping = Node::new_mapping(
                0,
                vec![
                    (Node::synthetic_scalar(bucket_property), Node::synthetic_scalar(bucket)),
                    (Node::synthetic_scalar(key_property), Node::synthetic_scalar(key)),
                ],
                false,
                None,
                Position::synthetic(),
            );
            properties.replace_mapping_value(rule.property, mapping);
        }
        (Rewrite::SingleUrl(url), _, _) => {
            properties.replace_mapping_value(rule.property, Node::synthetic_scalar(url));
        }
        (rewrite, _, _) => {
            // A rule declaring only one of the two properties is a registry bug, not a runtime
            // condition; fall back to the single-URL form rather than silently dropping the asset.
            if let Rewrite::BucketAndKey(bucket, key) = rewrite {
                properties.replace_mapping_value(rule.property, Node::synthetic_scalar(format!("s3://{}/{}", bucket, key)));
            }
        }
    }
}

fn is_remote(path_str: &str) -> bool {
    path_str.starts_with("s3://") || path_str.starts_with("http://") || path_str.starts_with("https://")
}

fn resolve_local_path(path_str: &str, workspace_root: &Path) -> PathBuf {
    let path = Path::new(path_str);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::NodeIdGen;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockUploader {
        bucket: String,
        key: String,
        uploads: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Uploader for MockUploader {
        async fn upload(&self, bucket: &str, key: &str, _body: Vec<u8>) -> Result<String, Error> {
            self.uploads.lock().unwrap().push((bucket.to_owned(), key.to_owned()));
            Ok(format!("https://s3.amazonaws.com/{}/{}", self.bucket, self.key))
        }
    }

    #[tokio::test]
    async fn packages_a_lambda_functions_code_directory() {
        let dir = tempfile::tempdir().unwrap();
        let code_dir = dir.path().join("functions/hello");
        std::fs::create_dir_all(&code_dir).unwrap();
        std::fs::write(code_dir.join("index.js"), "exports.handler = () => {};").unwrap();

        let ids = NodeIdGen::new();
        let root = crate::yaml::parse(
            "Resources:\n  Hello:\n    Type: AWS::Lambda::Function\n    Properties:\n      Code: functions/hello\n",
            "template.yaml",
            &ids,
        )
        .unwrap();
        let mut template = Template::empty();
        template.merge(&root, "template.yaml").unwrap();

        let uploader = MockUploader {
            bucket: "mockBucket".to_owned(),
            key: "asdf".to_owned(),
            uploads: Mutex::new(Vec::new()),
        };

        package_resources(&template, dir.path(), "hello-svc", "mockBucket", &uploader, |_workload, hash| hash.to_owned())
            .await
            .unwrap();

        let code = template
            .section("Resources")
            .mapping_lookup("Hello")
            .unwrap()
            .mapping_lookup("Properties")
            .unwrap()
            .mapping_lookup("Code")
            .unwrap();
        assert_eq!(code.mapping_lookup("S3Bucket").unwrap().as_scalar_str().unwrap(), "mockBucket");
        assert_eq!(code.mapping_lookup("S3Key").unwrap().as_scalar_str().unwrap(), "asdf");
    }

    #[tokio::test]
    async fn a_remote_code_path_is_left_untouched() {
        let ids = NodeIdGen::new();
        let root = crate::yaml::parse(
            "Resources:\n  Hello:\n    Type: AWS::Lambda::Function\n    Properties:\n      Code: s3://already-there/key\n",
            "template.yaml",
            &ids,
        )
        .unwrap();
        let mut template = Template::empty();
        template.merge(&root, "template.yaml").unwrap();

        let uploader = MockUploader {
            bucket: "unused".to_owned(),
            key: "unused".to_owned(),
            uploads: Mutex::new(Vec::new()),
        };
        let dir = tempfile::tempdir().unwrap();

        package_resources(&template, dir.path(), "hello-svc", "mockBucket", &uploader, |_w, h| h.to_owned())
            .await
            .unwrap();

        assert!(uploader.uploads.lock().unwrap().is_empty());
        let code = template
            .section("Resources")
            .mapping_lookup("Hello")
            .unwrap()
            .mapping_lookup("Properties")
            .unwrap()
            .mapping_lookup("Code")
            .unwrap();
        assert_eq!(code.as_scalar_str().unwrap(), "s3://already-there/key");
    }

    #[tokio::test]
    async fn packaging_a_single_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("handler.js"), "exports.handler = () => {};").unwrap();

        let ids = NodeIdGen::new();
        let root = crate::yaml::parse(
            "Resources:\n  Hello:\n    Type: AWS::Lambda::Function\n    Properties:\n      Code: handler.js\n",
            "template.yaml",
            &ids,
        )
        .unwrap();
        let mut template = Template::empty();
        template.merge(&root, "template.yaml").unwrap();

        let uploader = MockUploader {
            bucket: "mockBucket".to_owned(),
            key: "asdf".to_owned(),
            uploads: Mutex::new(Vec::new()),
        };

        let error = package_resources(&template, dir.path(), "hello-svc", "mockBucket", &uploader, |_w, h| h.to_owned())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("packaging a single file is not supported"));
    }

    #[tokio::test]
    async fn a_rule_without_force_zip_uploads_a_single_file_as_is() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("handler.js"), "exports.handler = () => {};").unwrap();

        let uploader = MockUploader {
            bucket: "mockBucket".to_owned(),
            key: "asdf".to_owned(),
            uploads: Mutex::new(Vec::new()),
        };
        let rule = PackageRule {
            property: "Code",
            bucket_property: None,
            key_property: None,
            force_zip: false,
        };

        let rewrite = package_one("handler.js", dir.path(), "mockBucket", &uploader, &|_w, h| h.to_owned(), "hello-svc", &rule)
            .await
            .unwrap();

        assert!(matches!(rewrite, Some(Rewrite::SingleUrl(_))));
        assert_eq!(uploader.uploads.lock().unwrap().len(), 1);
    }
}
