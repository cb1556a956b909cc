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

use cfn_addons::{error::Error, provider::AwsxProvider};
use rusoto_core::Region;
use serde::{Serialize, Serializer};
use std::str::FromStr;
use structopt::StructOpt;

mod command;
mod util;

use command::package_addons;

#[derive(Debug, StructOpt)]
pub(crate) struct Opt {
    #[structopt(
        long = "aws-region",
        help = "Region the AWS API calls should be performed in",
        long_help = "Region the AWS API calls should be performed in. If left unspecified, the \
                     region will be determined automatically, falling back to us-east-1 should it \
                     fail."
    )]
    pub aws_region: Option<Region>,
    #[structopt(
        long = "aws-access-key-id",
        help = "AWS Access Key ID used for AWS API authentication",
        long_help = "AWS Access Key ID to use when authenticating against the AWS API. If left \
                     unspecified, the default credential provider will be used to determine the \
                     credentials (via environment variables, instance metadata, container metadata \
                     or AWS profiles). You have to specify --aws-secret-access-key too if you \
                     specify this parameter.",
        requires = "aws_secret_access_key"
    )]
    pub aws_access_key_id: Option<String>,
    #[structopt(
        long = "aws-secret-access-key",
        help = "AWS Secret Access Key used for AWS API authentication",
        long_help = "AWS Secret Access Key to use when authenticating against the AWS API. If left \
                     unspecified, the default credential provider will be used to determine the \
                     credentials (via environment variables, instance metadata, container metadata \
                     or AWS profiles). You have to specify --aws-access-key-id too if you specify \
                     this parameter.",
        requires = "aws_access_key_id"
    )]
    pub aws_secret_access_key: Option<String>,
    #[structopt(
        long = "assume-role-arn",
        help = "Optional role to assume before executing AWS API calls",
        long_help = "Optional role to assume before executing AWS API calls. This can be used to \
                     execute commands in other accounts, or to separate the actions performable \
                     in a single account. If unspecified, no role will be assumed."
    )]
    pub assume_role_arn: Option<String>,
    #[structopt(
        long = "output-format",
        help = "Specify the format of the application output",
        long_help = "Specify the format of the application output. The default, if left \
                     unspecified, depends on whether stdout is a TTY. If it is, the output will be \
                     human readable. If it isn't, the contents will be output in structured form, \
                     specifically JSON.",
        raw(possible_values = r#"&["human", "human-readable", "structured", "json"]"#)
    )]
    pub output_format: Option<OutputFormat>,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(
        name = "package-workload-addons",
        about = "Compose and package a workload's CloudFormation addons",
        long_about = "Merge every template fragment under a workload's addons directory, validate \
                      its parameters file, upload any local assets referenced by packageable \
                      resources to S3, and write out the composed template and parameters.",
        after_help = "IAM permissions required:\n\
                      - s3:PutObject"
    )]
    PackageWorkloadAddons(package_addons::WorkloadOpt),
    #[structopt(
        name = "package-env-addons",
        about = "Compose and package the shared environment CloudFormation addons",
        long_about = "Merge every template fragment under the shared environment addons \
                      directory, validate its parameters file, upload any local assets referenced \
                      by packageable resources to S3, and write out the composed template and \
                      parameters.",
        after_help = "IAM permissions required:\n\
                      - s3:PutObject"
    )]
    PackageEnvAddons(package_addons::EnvOpt),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputFormat {
    HumanReadable,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        if atty::is(atty::Stream::Stdout) {
            OutputFormat::HumanReadable
        } else {
            OutputFormat::Json
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" | "human-readable" => Ok(OutputFormat::HumanReadable),
            "json" | "structured" => Ok(OutputFormat::Json),
            _ => Err(Error::UnknownOutputFormat(s.to_owned())),
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let opt = Opt::from_args();
    let provider = match AwsxProvider::new(
        opt.assume_role_arn.clone(),
        opt.aws_region.clone().unwrap_or_default(),
        opt.aws_access_key_id.clone(),
        opt.aws_secret_access_key.clone(),
    ) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("failed to set up AWS credentials: {}", e);
            std::process::exit(1);
        }
    };

    use Command::*;
    let output: Result<AwsxOutput, Error> = match &opt.command {
        PackageWorkloadAddons(command_opt) => {
            package_addons::package_workload_addons(command_opt, &opt, provider).await
        }
        PackageEnvAddons(command_opt) => {
            package_addons::package_env_addons(command_opt, &opt, provider).await
        }
    };
    match output {
        Ok(output) => {
            let output_string = match opt.output_format.unwrap_or_default() {
                OutputFormat::HumanReadable => output.human_readable,
                OutputFormat::Json => serde_json::to_string(&output.structured).unwrap(),
            };
            if output.successful {
                println!("{}", output_string);
            } else {
                eprintln!("{}", output_string);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
}

#[derive(Debug)]
pub(crate) struct AwsxOutput {
    human_readable: String,
    structured: serde_json::Value,
    successful: bool,
}

impl Serialize for AwsxOutput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.structured.serialize(serializer)
    }
}
