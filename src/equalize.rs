use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::info;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::{
    config::Config,
    error::Result,
    probe::Prober,
    tools::{run_checked, ToolCommand},
};

/// What happens to one clip to bring it to the batch maximum duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipPlan {
    /// already the longest, hard link it under the target name
    Link,
    /// concatenate `repeats` copies and trim to the maximum
    Loop { repeats: usize },
    /// no usable duration
    Skip,
}

impl ClipPlan {
    pub fn new(duration: Option<f64>, max_length: Option<f64>) -> Self {
        match (duration, max_length) {
            (Some(d), Some(max)) if d == max => ClipPlan::Link,
            (Some(d), Some(max)) if d > 0.0 && d < max => {
                let mut repeats = (max / d).floor() as usize;
                if max % d != 0.0 {
                    repeats += 1;
                }
                ClipPlan::Loop { repeats }
            }
            _ => ClipPlan::Skip,
        }
    }
}

/// Longest of the probed durations, ignoring failed probes.
pub fn max_duration(durations: &[Option<f64>]) -> Option<f64> {
    durations.iter().flatten().copied().reduce(f64::max)
}

/// `<stem><marker><ext>` next to the source clip.
pub fn marked_path(folder: &Path, file: &str, marker: &str) -> PathBuf {
    let path = Path::new(file);
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    match path.extension() {
        Some(ext) => folder.join(format!("{}{}.{}", stem, marker, ext.to_string_lossy())),
        None => folder.join(format!("{}{}", stem, marker)),
    }
}

pub fn manifest_path(folder: &Path, file: &str) -> PathBuf {
    let stem = Path::new(file).file_stem().unwrap_or_default().to_string_lossy();
    folder.join(format!("list_{}.txt", stem))
}

/// Concat demuxer list naming `file` once per repetition.
pub fn write_concat_manifest(manifest: &Path, file: &str, repeats: usize) -> std::io::Result<()> {
    let f = std::fs::File::create(manifest)?;
    let mut f = BufWriter::new(f);
    for _ in 0..repeats {
        f.write_all(format!("file \'{}\'\n", file).as_bytes())?;
    }
    f.flush()
}

pub fn concat_command(config: &Config, manifest: &Path, max_length: f64, target: &Path) -> ToolCommand {
    ToolCommand::new(&config.encoder)
        .args(["-f", "concat", "-safe", "0", "-i"])
        .arg(manifest)
        .args(["-c", "copy", "-t"])
        .arg(max_length.to_string())
        .arg(target)
        .args(["-loglevel", config.loglevel.as_str()])
}

/// Write a `_TV` clip into `folder` for every clip in `clips` (file names),
/// all lasting as long as the longest one.
///
/// Clips are processed on a worker pool; the first failing clip aborts the call.
/// Nothing is written when no clip has a readable duration.
pub fn equalize(folder: &Path, clips: &[String], prober: &Prober, config: &Config) -> Result<()> {
    let durations = clips
        .iter()
        .map(|clip| prober.duration(&folder.join(clip)))
        .collect::<Vec<_>>();
    println!("Input Video Time List: {}", format_durations(&durations));

    let Some(max_length) = max_duration(&durations) else {
        return Ok(());
    };

    let threadpool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.nproc)
        .build()?;
    threadpool.install(|| {
        clips
            .par_iter()
            .zip(durations.par_iter())
            .try_for_each(|(clip, duration)| {
                process_clip(folder, clip, *duration, max_length, prober, config)
            })
    })
}

fn process_clip(
    folder: &Path,
    clip: &str,
    duration: Option<f64>,
    max_length: f64,
    prober: &Prober,
    config: &Config,
) -> Result<()> {
    let source = folder.join(clip);
    let target = marked_path(folder, clip, &config.target_marker);

    match ClipPlan::new(duration, Some(max_length)) {
        ClipPlan::Link => {
            remove_stale(&target)?;
            std::fs::hard_link(&source, &target)?;
            info!("{}: longest clip, linked to {}", clip, target.display());
        }
        ClipPlan::Loop { repeats } => {
            let manifest = manifest_path(folder, clip);
            write_concat_manifest(&manifest, clip, repeats)?;
            remove_stale(&target)?;
            run_checked(
                prober.runner(),
                &concat_command(config, &manifest, max_length, &target),
            )?;
            info!("{}: looped {} times into {}", clip, repeats, target.display());
        }
        ClipPlan::Skip => info!("{}: no duration, skipped", clip),
    }
    Ok(())
}

/// Leftover from an aborted run; ffmpeg would stop to ask about overwriting it.
fn remove_stale(target: &Path) -> std::io::Result<()> {
    if target.is_file() {
        std::fs::remove_file(target)?;
    }
    Ok(())
}

fn format_durations(durations: &[Option<f64>]) -> String {
    let items = durations
        .iter()
        .map(|d| match d {
            Some(d) => format!("{:?}", d),
            None => "None".to_string(),
        })
        .collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}
