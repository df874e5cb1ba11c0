use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    grid::GridVariant,
    utils,
};

/// Settings shared by every stage of a merge run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Recognized video extensions, the first one is used for the output file
    pub extensions: Vec<String>,
    /// Output size is the cell size times the grid dimension
    pub match_input_resolution: bool,
    pub variant: GridVariant,
    /// Filename fragments of the files removed after a run
    pub temp_markers: Vec<String>,
    /// Fragment stamped into equalized clip names
    pub target_marker: String,
    pub loglevel: String,
    pub encoder: String,
    pub prober: String,
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    /// Worker pool size (0 = available parallelism)
    pub nproc: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            extensions: vec![".mov".into(), ".mp4".into()],
            match_input_resolution: true,
            variant: GridVariant::V1,
            temp_markers: vec!["_TV".into(), "_LP".into(), ".txt".into()],
            target_marker: "_TV".into(),
            loglevel: "error".into(),
            encoder: "ffmpeg".into(),
            prober: "ffprobe".into(),
            input_folder: PathBuf::from("./video_grid_merge/media/input"),
            output_folder: PathBuf::from("./video_grid_merge/media/output"),
            nproc: 0,
        }
    }
}

impl Config {
    /// Load settings from an explicit file (created with defaults when missing)
    /// or from the user config dir, falling back to built-in defaults.
    pub fn load(config_file: Option<&Path>) -> Result<Config> {
        match config_file {
            Some(path) => {
                if !path.exists() {
                    Config::default().write_default(path)?;
                }
                Config::read(path)
            }
            None => match Config::user_config_path() {
                Some(path) if path.exists() => Config::read(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vgm-rs").join("config.json"))
    }

    fn read(path: &Path) -> Result<Config> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|source| Error::Config {
            path: path.to_owned(),
            source,
        })
    }

    pub fn write_default(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            utils::mkdir(parent)?;
        }
        let mut writer = File::create(path)?;
        let json = serde_json::to_string_pretty(self).map_err(|source| Error::Config {
            path: path.to_owned(),
            source,
        })?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Extension appended to output names lacking a recognized one.
    pub fn default_extension(&self) -> &str {
        self.extensions.first().map(String::as_str).unwrap_or(".mp4")
    }
}
