use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use clap::Args;

use crate::{config::Config, error::Result, prompt, utils};

#[derive(Args, Debug, Clone)]
#[command(about = "Delete intermediate files left in the input folder")]
pub struct Opt {
    /// input folder
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// don't ask for confirmation
    #[arg(long)]
    yes: bool,
}

pub fn main(opt: Opt, config: Config) -> Result<()> {
    let folder = opt.input.unwrap_or_else(|| config.input_folder.clone());
    let deleted = if opt.yes {
        utils::delete_intermediates(&folder, &config.temp_markers)?
    } else {
        delete_with_confirmation(
            &folder,
            &config.temp_markers,
            &mut io::stdin().lock(),
            &mut io::stdout(),
        )?
    };
    for path in deleted {
        println!("Deleted: {}", path.display());
    }
    Ok(())
}

pub fn delete_with_confirmation<R: BufRead, W: Write>(
    folder: &Path,
    markers: &[String],
    input: &mut R,
    out: &mut W,
) -> Result<Vec<PathBuf>> {
    let prompt = format!(
        "\nFiles other than input videos were created in the following paths.\n\
         Do you want to delete the created files?[y/N]\n{}\n",
        folder.display()
    );
    if prompt::confirm(input, out, &prompt)? {
        Ok(utils::delete_intermediates(folder, markers)?)
    } else {
        Ok(Vec::new())
    }
}
