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

//! The asset packager's upload collaborator: a place to put zipped bytes, and get back a URL that
//! names where they ended up.

use async_trait::async_trait;
use rusoto_core::{HttpClient, Region};
use rusoto_s3::{PutObjectRequest, S3Client, StreamingBody, S3};

use crate::error::Error;
use crate::provider::AwsxProvider;

/// Uploads packaged assets somewhere a CloudFormation deployment can later fetch them from.
#[async_trait]
pub trait Uploader {
    /// Upload `body` to `key` within `bucket`, returning the URL it can be fetched back from.
    async fn upload(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<String, Error>;
}

/// An [`Uploader`] backed by S3, reusing the same Rusoto client setup the rest of this crate uses
/// for every other AWS call.
pub struct S3Uploader {
    region: Region,
    s3_client: S3Client,
}

impl S3Uploader {
    /// Create a new S3-backed uploader.
    pub fn new(region: Region, provider: AwsxProvider) -> S3Uploader {
        let s3_client = S3Client::new_with(HttpClient::new().expect("failed to create HTTP client"), provider, region.clone());
        S3Uploader { region, s3_client }
    }
}

#[async_trait]
impl Uploader for S3Uploader {
    async fn upload(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<String, Error> {
        self.s3_client
            .put_object(PutObjectRequest {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                body: Some(StreamingBody::from(body)),
                server_side_encryption: Some("AES256".to_owned()),
                ..Default::default()
            })
            .await?;
        Ok(format!(
            "https://s3{region}.amazonaws.com/{bucket}/{key}",
            region = if self.region != Region::UsEast1 {
                format!("-{}", self.region.name())
            } else {
                String::new()
            },
            bucket = bucket,
            key = key,
        ))
    }
}

/// Parse an uploader's returned `https://s3[-region].amazonaws.com/{bucket}/{key}` URL back into
/// its (bucket, key) components.
///
/// The packager trusts this over its own upload arguments, since a collaborator is free to
/// redirect or rename on its way to producing the final, fetchable location.
pub fn parse_object_url(url: &str) -> Option<(String, String)> {
    let without_scheme = url.strip_prefix("https://")?;
    let mut host_and_rest = without_scheme.splitn(2, '/');
    let _host = host_and_rest.next()?;
    let rest = host_and_rest.next()?;
    let mut bucket_and_key = rest.splitn(2, '/');
    let bucket = bucket_and_key.next()?.to_owned();
    let key = bucket_and_key.next()?.to_owned();
    Some((bucket, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_us_east_1_style_url() {
        let (bucket, key) = parse_object_url("https://s3.amazonaws.com/mockBucket/asdf").unwrap();
        assert_eq!(bucket, "mockBucket");
        assert_eq!(key, "asdf");
    }

    #[test]
    fn parses_a_region_qualified_url_with_a_nested_key() {
        let (bucket, key) = parse_object_url("https://s3-eu-west-1.amazonaws.com/my-bucket/assets/lambda/abc123.zip").unwrap();
        assert_eq!(bucket, "my-bucket");
        assert_eq!(key, "assets/lambda/abc123.zip");
    }

    #[test]
    fn rejects_a_non_s3_url() {
        assert!(parse_object_url("s3://bucket/key").is_none());
    }
}
