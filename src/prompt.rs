use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

pub const DEFAULT_OUTPUT_STEM: &str = "combined_video";

/// Empty names become `combined_video<default_ext>`, names without a recognized
/// extension get `default_ext` appended.
pub fn normalize_output_name(name: &str, extensions: &[String], default_ext: &str) -> String {
    let name = name.trim();
    let mut name = if name.is_empty() {
        format!("{}{}", DEFAULT_OUTPUT_STEM, default_ext)
    } else {
        name.to_string()
    };
    if !extensions.iter().any(|e| name.ends_with(e.as_str())) {
        name.push_str(default_ext);
    }
    name
}

/// Ask for the output file name until it is free or overwriting is confirmed.
pub fn output_path_from_user<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    output_folder: &Path,
    extensions: &[String],
    default_ext: &str,
) -> Result<PathBuf> {
    loop {
        let answer = ask(
            input,
            out,
            &format!(
                "Enter the name of the output file (default is '{}{}'): ",
                DEFAULT_OUTPUT_STEM, default_ext
            ),
        )?;
        let name = normalize_output_name(&answer, extensions, default_ext);
        let output_path = output_folder.join(&name);
        if output_path.exists()
            && !confirm(
                input,
                out,
                &format!("File {} already exists. Overwrite? (y/n): ", name),
            )?
        {
            continue;
        }
        return Ok(output_path);
    }
}

/// `true` only for an answer of `y`/`Y`.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<bool> {
    Ok(ask(input, out, prompt)?.trim().eq_ignore_ascii_case("y"))
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<String> {
    write!(out, "{}", prompt)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(Error::NoInput);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
