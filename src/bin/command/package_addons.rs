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

use cfn_addons::{
    addons::{environment, workload},
    error::Error,
    package::{self, uploader::S3Uploader},
    yaml::NodeIdGen,
};
use serde_json::json;
use structopt::StructOpt;

use crate::{util::write_output, AwsxOutput, AwsxProvider, Opt as GlobalOpt};

#[derive(Debug, StructOpt)]
pub(crate) struct WorkloadOpt {
    #[structopt(long = "workspace", help = "Path to the copilot workspace root")]
    workspace: String,
    #[structopt(long = "workload-name", help = "Name of the workload whose addons to package")]
    workload_name: String,
    #[structopt(
        long = "s3-bucket-name",
        help = "Name of the S3 bucket to upload packaged assets to"
    )]
    s3_bucket_name: String,
    #[structopt(long = "template-output", help = "Where to write the composed template (stdout if omitted)")]
    template_output: Option<String>,
    #[structopt(long = "parameters-output", help = "Where to write the validated parameters (stdout if omitted)")]
    parameters_output: Option<String>,
}

#[derive(Debug, StructOpt)]
pub(crate) struct EnvOpt {
    #[structopt(long = "workspace", help = "Path to the copilot workspace root")]
    workspace: String,
    #[structopt(
        long = "s3-bucket-name",
        help = "Name of the S3 bucket to upload packaged assets to"
    )]
    s3_bucket_name: String,
    #[structopt(long = "template-output", help = "Where to write the composed template (stdout if omitted)")]
    template_output: Option<String>,
    #[structopt(long = "parameters-output", help = "Where to write the validated parameters (stdout if omitted)")]
    parameters_output: Option<String>,
}

pub(crate) async fn package_workload_addons(
    opt: &WorkloadOpt,
    global_opt: &GlobalOpt,
    provider: AwsxProvider,
) -> Result<AwsxOutput, Error> {
    let workspace = cfn_addons::addons::io::FilesystemWorkspace::new(std::path::Path::new(&opt.workspace));
    let ids = NodeIdGen::new();
    let mut stack = workload::parse_from_workload(&workspace, &opt.workload_name, &ids)?;

    let region = global_opt.aws_region.clone().unwrap_or_default();
    let uploader = S3Uploader::new(region, provider);
    package(&mut stack, workspace.root(), &opt.workload_name, &opt.s3_bucket_name, &uploader).await?;

    write_output(opt.template_output.as_deref(), &stack.template())?;
    write_output(opt.parameters_output.as_deref(), &stack.parameters())?;

    Ok(AwsxOutput {
        human_readable: format!("packaged addons for workload \"{}\"", opt.workload_name),
        structured: json!({"success": true, "workload": opt.workload_name}),
        successful: true,
    })
}

pub(crate) async fn package_env_addons(
    opt: &EnvOpt,
    global_opt: &GlobalOpt,
    provider: AwsxProvider,
) -> Result<AwsxOutput, Error> {
    let workspace = cfn_addons::addons::io::FilesystemWorkspace::new(std::path::Path::new(&opt.workspace));
    let ids = NodeIdGen::new();
    let mut stack = environment::parse_from_env(&workspace, &ids)?;

    let region = global_opt.aws_region.clone().unwrap_or_default();
    let uploader = S3Uploader::new(region, provider);
    package(&mut stack, workspace.root(), "environment", &opt.s3_bucket_name, &uploader).await?;

    write_output(opt.template_output.as_deref(), &stack.template())?;
    write_output(opt.parameters_output.as_deref(), &stack.parameters())?;

    Ok(AwsxOutput {
        human_readable: "packaged shared environment addons".to_owned(),
        structured: json!({"success": true}),
        successful: true,
    })
}

async fn package(
    stack: &mut cfn_addons::addons::Stack,
    workspace_root: &std::path::Path,
    name: &str,
    bucket: &str,
    uploader: &S3Uploader,
) -> Result<(), Error> {
    let artifact_key_path = |name: &str, hash: &str| format!("manual/addons/{}/{}.zip", name, hash);
    package::package_resources(stack.template_mut(), workspace_root, name, bucket, uploader, artifact_key_path).await
}
