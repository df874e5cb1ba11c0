use std::path::PathBuf;

use clap::Args;

use crate::{config::Config, error::Result, utils};

#[derive(Args, Debug, Clone)]
#[command(about = "Replace spaces in clip file names with underscores")]
pub struct Opt {
    /// input folder (searched recursively)
    #[arg(short, long)]
    input: Option<PathBuf>,
}

pub fn main(opt: Opt, config: Config) -> Result<()> {
    let folder = opt.input.unwrap_or(config.input_folder);
    let renamed = utils::rename_files_with_spaces(&folder)?;
    if renamed.is_empty() {
        println!("Nothing to rename in {}", folder.display());
    }
    Ok(())
}
