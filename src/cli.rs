use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "s3-explorer",
    version,
    about = "Browse S3 buckets and download objects from the terminal"
)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// AWS profile to use
    #[arg(long)]
    pub profile: Option<String>,

    /// AWS region override
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Address buckets by path instead of virtual host
    #[arg(long)]
    pub path_style: bool,

    /// Where downloaded files are written
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `s3_explorer=debug`
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn apply(&self, config: &mut Config) {
        if let Some(profile) = &self.profile {
            config.profile = Some(profile.clone());
        }
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
        if let Some(endpoint) = &self.endpoint_url {
            config.endpoint_url = Some(endpoint.clone());
        }
        if self.path_style {
            config.force_path_style = true;
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }
    }
}
