use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use clap::Args;
use log::warn;

use crate::{
    config::Config,
    csv_output::CsvOutput,
    error::Result,
    tools::{path_str, SystemRunner, ToolCommand, ToolRunner},
    utils,
};

/// (width, height) in pixels
pub type Size = (u32, u32);

#[derive(Args, Debug, Clone)]
#[command(about = "Print size and duration of every clip in a folder")]
pub struct Opt {
    /// input folder
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// save probe results to a csv table
    #[arg(long = "csv")]
    csv_path: Option<PathBuf>,
}

pub fn main(opt: Opt, config: Config) -> Result<()> {
    let folder = opt.input.unwrap_or_else(|| config.input_folder.clone());
    let prober = Prober::new(Arc::new(SystemRunner), &config);
    let mut csv_output = match &opt.csv_path {
        Some(p) => {
            let mut out = CsvOutput::new(p)?;
            out.write_header()?;
            Some(out)
        }
        None => None,
    };

    for file in utils::video_files(&folder, &config.extensions)? {
        let clip = prober.describe(&folder.join(&file));
        println!(
            "{}\t{}\t{}",
            clip.path.display(),
            clip.size
                .map(|(w, h)| format!("{}x{}", w, h))
                .unwrap_or_else(|| "?".into()),
            clip.duration
                .map(|d| format!("{:.2}s", d))
                .unwrap_or_else(|| "?".into()),
        );
        if let Some(out) = csv_output.as_mut() {
            out.write_clip(&clip)?;
        }
    }
    Ok(())
}

/// What probing learned about one clip. `None` fields mean the probe failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    pub path: PathBuf,
    pub size: Option<Size>,
    /// seconds
    pub duration: Option<f64>,
}

/// Queries ffprobe/ffmpeg for clip properties and memoizes the answers per path.
///
/// Failures are cached too, so a broken file is only asked about once.
pub struct Prober {
    runner: Arc<dyn ToolRunner>,
    prober: String,
    encoder: String,
    loglevel: String,
    sizes: RwLock<HashMap<PathBuf, Option<Size>>>,
    durations: RwLock<HashMap<PathBuf, Option<f64>>>,
}

impl Prober {
    pub fn new(runner: Arc<dyn ToolRunner>, config: &Config) -> Self {
        Prober {
            runner,
            prober: config.prober.clone(),
            encoder: config.encoder.clone(),
            loglevel: config.loglevel.clone(),
            sizes: RwLock::new(HashMap::new()),
            durations: RwLock::new(HashMap::new()),
        }
    }

    pub fn runner(&self) -> &dyn ToolRunner {
        self.runner.as_ref()
    }

    pub fn describe(&self, path: &Path) -> ClipInfo {
        ClipInfo {
            path: path.to_owned(),
            size: self.size(path),
            duration: self.duration(path),
        }
    }

    pub fn size(&self, path: &Path) -> Option<Size> {
        if let Some(size) = self.sizes.read().unwrap().get(path) {
            return *size;
        }
        let size = self.probe_size(path);
        *self
            .sizes
            .write()
            .unwrap()
            .entry(path.to_owned())
            .or_insert(size)
    }

    pub fn duration(&self, path: &Path) -> Option<f64> {
        if let Some(duration) = self.durations.read().unwrap().get(path) {
            return *duration;
        }
        let duration = self.probe_duration(path);
        *self
            .durations
            .write()
            .unwrap()
            .entry(path.to_owned())
            .or_insert(duration)
    }

    /// Forget every memoized answer.
    pub fn clear_cache(&self) {
        self.sizes.write().unwrap().clear();
        self.durations.write().unwrap().clear();
    }

    fn probe_size(&self, path: &Path) -> Option<Size> {
        let cmd = ToolCommand::new(&self.prober)
            .args(["-v", self.loglevel.as_str()])
            .args(["-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height"])
            .args(["-of", "csv=s=x:p=0"])
            .arg(path);
        let output = match self.runner.output(&cmd) {
            Ok(o) => o,
            Err(e) => {
                warn!("Can't run {}: {}", &self.prober, e);
                return None;
            }
        };
        if !output.success {
            warn!(
                "Can't get video size of {}: {}",
                path.display(),
                output.combined().trim()
            );
            return None;
        }
        let size = parse_size(&output.stdout);
        if size.is_none() {
            warn!("Failed to extract video size from {}", path.display());
        }
        size
    }

    fn probe_duration(&self, path: &Path) -> Option<f64> {
        let cmd = ToolCommand::new(&self.encoder).arg("-i").arg(path);
        // ffmpeg exits non-zero here since no output is given; only the text matters
        let output = match self.runner.output(&cmd) {
            Ok(o) => o,
            Err(e) => {
                warn!("Can't run {}: {}", &self.encoder, e);
                return None;
            }
        };
        let duration = parse_duration(&output.combined());
        if duration.is_none() {
            warn!(
                "Failed to extract duration from FFmpeg output: {}",
                path_str(path)
            );
        }
        duration
    }
}

/// First two decimal integers of the ffprobe answer, e.g. `640x360`.
pub fn parse_size(output: &str) -> Option<Size> {
    let mut numbers = output
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(str::parse::<u32>);
    match (numbers.next(), numbers.next()) {
        (Some(Ok(w)), Some(Ok(h))) => Some((w, h)),
        _ => None,
    }
}

/// Seconds from the first `Duration: HH:MM:SS.ff,` line of ffmpeg's info output.
pub fn parse_duration(output: &str) -> Option<f64> {
    let line = output.lines().find(|l| l.contains("Duration"))?;
    let (_, rest) = line.split_once("Duration: ")?;
    let text = rest.split(',').next()?.trim();
    let parts = text
        .split(':')
        .map(|p| p.parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()?;
    match parts[..] {
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        _ => None,
    }
}
