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

//! Errors within cfn-addons

#![allow(non_local_definitions)]

use failure::Fail;

/// Representation of an error within cfn-addons.
#[derive(Debug, Fail)]
pub enum Error {
    /// Error caused in Rusoto, in proxy from AWS.
    #[fail(display = "failed to perform AWS action: {}", 0)]
    AwsError(#[fail(cause)] failure::Error),
    /// TLS error caused within Rusoto.
    #[fail(display = "failed to perform Rusoto action")]
    TlsError(#[fail(cause)] failure::Error),
    /// An unknown error caused in Rusoto, in proxy from AWS.
    #[fail(display = "encountered AWS error:\n{}", 0)]
    UnknownAwsError(String),
    /// A general IO error.
    #[fail(display = "general IO error")]
    IoError(#[fail(cause)] std::io::Error),
    /// Error caused in serde_json
    #[fail(display = "failed to perform serde_json action: {}", 0)]
    SerdeJsonError(#[fail(cause)] serde_json::Error),
    /// Error caused while scanning a YAML document.
    #[fail(display = "failed to scan YAML: {}", 0)]
    YamlScanError(#[fail(cause)] yaml_rust2::ScanError),
    /// Error caused while building a zip archive.
    #[fail(display = "failed to build zip archive: {}", 0)]
    ZipError(#[fail(cause)] zip::result::ZipError),
    /// The output format specified was unknown
    #[fail(display = "specified output format is unknown: {}", 0)]
    UnknownOutputFormat(String),

    /// The addons directory is missing, empty, or contains no template fragments.
    #[fail(display = "{}", 0)]
    AddonsNotFound(String),
    /// A template fragment failed to parse as YAML.
    #[fail(display = "failed to parse template \"{}\": {}", file, cause)]
    TemplateParseError {
        /// The file that failed to parse.
        file: String,
        /// The underlying parse failure.
        cause: String,
    },
    /// Two Nodes reachable under the same section key are not structurally equal.
    #[fail(display = "{}", 0)]
    SectionConflict(String),
    /// Both `addons.parameters.yaml` and `addons.parameters.yml` are present.
    #[fail(display = "{}", 0)]
    MultipleParameterFiles(String),
    /// The parameters file lacks its top-level `Parameters` key.
    #[fail(display = "{}", 0)]
    MissingParametersField(String),
    /// Reading the parameters file failed.
    #[fail(display = "failed to read parameters file \"{}\": {}", file, cause)]
    ParameterFileReadError {
        /// The parameters file that could not be read.
        file: String,
        /// The underlying I/O failure.
        #[fail(cause)]
        cause: std::io::Error,
    },
    /// The parameters file declares one of the reserved keys.
    #[fail(display = "{}", 0)]
    ReservedParameterDeclared(String),
    /// The merged template omits a reserved key.
    #[fail(display = "{}", 0)]
    MissingRequiredReservedParameter(String),
    /// The parameters file references a key the template does not declare.
    #[fail(display = "{}", 0)]
    ExtraParameter(String),
    /// The template declares a non-defaulted parameter the parameters file does not supply.
    #[fail(display = "{}", 0)]
    MissingParameterForNoDefault(String),
    /// Packaging a resource's asset failed (stat, zip, upload, or URL parse).
    #[fail(display = "{}", 0)]
    PackageError(String),
}

impl Error {
    /// Build an `AddonsNotFound`, optionally wrapping an underlying listing error.
    pub fn addons_not_found(cause: Option<String>) -> Error {
        match cause {
            Some(cause) => Error::AddonsNotFound(format!(
                "no CloudFormation template fragments found in the addons directory: {}",
                cause
            )),
            None => {
                Error::AddonsNotFound("no CloudFormation template fragments found in the addons directory".to_owned())
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(cause: std::io::Error) -> Self {
        Error::IoError(cause)
    }
}

impl From<serde_json::Error> for Error {
    fn from(cause: serde_json::Error) -> Self {
        Error::SerdeJsonError(cause)
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(cause: yaml_rust2::ScanError) -> Self {
        Error::YamlScanError(cause)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(cause: zip::result::ZipError) -> Self {
        Error::ZipError(cause)
    }
}

impl<E> From<rusoto_core::RusotoError<E>> for Error
where
    E: std::error::Error + std::marker::Send + std::marker::Sync + 'static,
{
    fn from(cause: rusoto_core::RusotoError<E>) -> Self {
        match cause {
            rusoto_core::RusotoError::Unknown(rusoto_core::request::BufferedHttpResponse {
                body,
                ..
            }) => Error::UnknownAwsError(String::from_utf8_lossy(&body).into_owned()),
            _ => Error::AwsError(cause.into()),
        }
    }
}

impl From<rusoto_core::request::TlsError> for Error {
    fn from(cause: rusoto_core::request::TlsError) -> Self {
        Error::TlsError(cause.into())
    }
}
