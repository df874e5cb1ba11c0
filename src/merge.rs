use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use clap::Args;
use log::info;

use crate::{
    config::Config,
    equalize::equalize,
    error::{Error, Result},
    grid::{grid_dimension, GridCommandBuilder, GridVariant},
    probe::Prober,
    prompt,
    tools::{run_checked, SystemRunner},
    utils,
};

#[rustfmt::skip]
#[derive(Args, Debug, Clone, Default)]
#[command(about = "Stitch a perfect square number of clips into one grid video")]
pub struct Opt {
    /// input folder holding the clips
    #[arg(short, long, display_order = 0)]
    input: Option<PathBuf>,
    /// output folder
    #[arg(short, long, display_order = 0)]
    output: Option<PathBuf>,
    /// output file name (asked for when omitted)
    #[arg(short = 'n', long)]
    name: Option<String>,
    /// overwrite the file given with -n if it exists
    #[arg(short = 'y', long)]
    overwrite: bool,
    /// v1: scale, fast, audio copied {n}
    /// v2: keep aspect ratio (pad), crf 23, aac audio
    #[arg(long, value_enum)]
    variant: Option<GridVariant>,
    /// keep the output at the size of a single clip
    #[arg(long)]
    no_match_resolution: bool,
    /// number of simultaneously equalized clips (0 = all cores)
    #[arg(long)]
    nproc: Option<usize>,
    /// open the merged video when done
    #[arg(long)]
    open: bool,
}

impl Opt {
    fn apply(&self, config: &mut Config) {
        if let Some(i) = &self.input {
            config.input_folder = i.to_owned();
        }
        if let Some(o) = &self.output {
            config.output_folder = o.to_owned();
        }
        if let Some(v) = self.variant {
            config.variant = v;
        }
        if self.no_match_resolution {
            config.match_input_resolution = false;
        }
        if let Some(n) = self.nproc {
            config.nproc = n;
        }
    }
}

pub fn main(opt: Opt, mut config: Config) -> Result<()> {
    opt.apply(&mut config);
    let prober = Prober::new(Arc::new(SystemRunner), &config);
    let output_path = run(
        &config,
        &prober,
        opt.name.as_deref(),
        opt.overwrite,
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )?;
    if opt.open {
        open::that(&output_path)?;
    }
    Ok(())
}

/// Rename, validate, equalize, stitch and clean up. Returns the output file.
pub fn run<R: BufRead, W: Write>(
    config: &Config,
    prober: &Prober,
    name: Option<&str>,
    overwrite: bool,
    input: &mut R,
    out: &mut W,
) -> Result<PathBuf> {
    let start = Instant::now();
    let input_folder = config.input_folder.as_path();

    utils::rename_files_with_spaces(input_folder)?;
    let video_files = utils::video_files(input_folder, &config.extensions)?;
    check_clip_count(video_files.len(), input_folder)?;
    utils::mkdir(&config.output_folder)?;

    equalize(input_folder, &video_files, prober, config)?;
    let input_files = utils::target_files(
        input_folder,
        &utils::list_dir(input_folder)?,
        &config.target_marker,
        &config.extensions,
    );

    let output_path = match name {
        Some(n) => supplied_output_path(n, config, overwrite)?,
        None => prompt::output_path_from_user(
            input,
            out,
            &config.output_folder,
            &config.extensions,
            config.default_extension(),
        )?,
    };

    let command = GridCommandBuilder::new(prober, config)
        .build(&input_files, &output_path)
        .ok_or(Error::EmptyCommand {
            count: input_files.len(),
        })?;
    info!("{}", command);

    writeln!(out, "Video Grid Merge Start")?;
    run_checked(prober.runner(), &command)?;
    let deleted = utils::delete_intermediates(input_folder, &config.temp_markers)?;
    info!("Deleted {} intermediate files", deleted.len());
    writeln!(out, "Video Grid Merge End And Output Success")?;
    writeln!(out, "File Output Complete: {}", output_path.display())?;
    writeln!(
        out,
        "Processing Time(s): {:.8}\n",
        start.elapsed().as_secs_f64()
    )?;
    Ok(output_path)
}

/// At least 4 clips, forming a square grid.
pub fn check_clip_count(count: usize, folder: &Path) -> Result<()> {
    let dim = grid_dimension(count);
    if count < 4 || dim * dim != count {
        return Err(Error::NotPerfectSquare {
            count,
            folder: folder.to_owned(),
        });
    }
    Ok(())
}

fn supplied_output_path(name: &str, config: &Config, overwrite: bool) -> Result<PathBuf> {
    let name = prompt::normalize_output_name(name, &config.extensions, config.default_extension());
    let output_path = config.output_folder.join(name);
    if output_path.exists() && !overwrite {
        return Err(Error::OutputExists(output_path));
    }
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, fs, io::Cursor};

    use rstest::rstest;

    use super::*;
    use crate::tools::{fake::*, ToolCommand, ToolOutput};

    #[rstest]
    #[case(0, false)]
    #[case(1, false)]
    #[case(3, false)]
    #[case(4, true)]
    #[case(5, false)]
    #[case(8, false)]
    #[case(9, true)]
    #[case(15, false)]
    #[case(16, true)]
    fn test_check_clip_count(#[case] count: usize, #[case] ok: bool) {
        assert_eq!(check_clip_count(count, Path::new("in")).is_ok(), ok);
    }

    #[test]
    fn test_check_clip_count_message_names_folder() {
        let err = check_clip_count(3, Path::new("./media/input")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("perfect square"), "{msg}");
        assert!(msg.contains("./media/input"), "{msg}");
    }

    /// ffprobe/ffmpeg stand-in covering size and duration probes, concat runs
    /// and the final stitch.
    fn fake_tools(durations: HashMap<&'static str, f64>) -> FakeRunner {
        FakeRunner::new()
            .on("ffprobe", |_| Ok(ok("640x360\n")))
            .on("ffmpeg", move |cmd: &ToolCommand| {
                if cmd.args.iter().any(|a| a == "concat") {
                    let t = cmd.args.iter().position(|a| a == "-t").unwrap();
                    fs::write(&cmd.args[t + 2], "looped")?;
                    return Ok(ok(""));
                }
                if cmd.args.iter().any(|a| a == "-filter_complex") {
                    fs::write(last_arg(cmd), "grid")?;
                    return Ok(ok(""));
                }
                let name = last_arg(cmd).file_name().unwrap().to_string_lossy().into_owned();
                Ok(match durations.get(name.as_str()) {
                    Some(d) => ToolOutput {
                        stderr: format!("  Duration: 00:00:{:05.2}, start: 0.000000", d),
                        ..failed("")
                    },
                    None => failed("Invalid data"),
                })
            })
    }

    fn config_for(dir: &Path) -> Config {
        Config {
            input_folder: dir.join("input"),
            output_folder: dir.join("output"),
            ..Config::default()
        }
    }

    fn write_clips(folder: &Path, names: &[&str]) {
        fs::create_dir_all(folder).unwrap();
        for n in names {
            fs::write(folder.join(n), n).unwrap();
        }
    }

    #[test]
    fn test_run_four_clips() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        write_clips(
            &config.input_folder,
            &["sample 1.mov", "sample2.mov", "sample3.mov", "sample4.mov", "notes.md"],
        );
        let durations = HashMap::from([
            ("sample_1.mov", 10.0),
            ("sample2.mov", 5.0),
            ("sample3.mov", 15.0),
            ("sample4.mov", 3.0),
        ]);
        let runner = Arc::new(fake_tools(durations));
        let prober = Prober::new(runner.clone(), &config);
        let mut out = Vec::<u8>::new();

        let output_path = run(&config, &prober, None, false, &mut Cursor::new("\n"), &mut out).unwrap();

        assert_eq!(output_path, config.output_folder.join("combined_video.mov"));
        assert_eq!(fs::read_to_string(&output_path).unwrap(), "grid");

        let stitch = runner
            .calls_to("ffmpeg")
            .into_iter()
            .find(|c| c.args.iter().any(|a| a == "-filter_complex"))
            .unwrap()
            .to_string();
        assert_eq!(stitch.matches("scale=640:360").count(), 4);
        assert_eq!(stitch.matches("hstack=inputs=2").count(), 2);
        assert_eq!(stitch.matches("vstack=inputs=2").count(), 1);
        assert!(stitch.contains("-s 1280x720"));
        for n in ["sample_1_TV.mov", "sample2_TV.mov", "sample3_TV.mov", "sample4_TV.mov"] {
            assert!(stitch.contains(&format!("-i {}", config.input_folder.join(n).display())));
        }

        let mut left = utils::list_dir(&config.input_folder).unwrap();
        left.sort();
        assert_eq!(
            left,
            vec!["notes.md", "sample2.mov", "sample3.mov", "sample4.mov", "sample_1.mov"]
        );

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Video Grid Merge Start"));
        assert!(printed.contains(&format!("File Output Complete: {}", output_path.display())));
        assert!(printed.contains("Processing Time(s): "));
    }

    #[test]
    fn test_run_non_square_count_stops_before_probing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        write_clips(&config.input_folder, &["a.mov", "b.mov", "c.mp4"]);
        let runner = Arc::new(fake_tools(HashMap::new()));
        let prober = Prober::new(runner.clone(), &config);

        let err = run(&config, &prober, None, false, &mut Cursor::new(""), &mut Vec::<u8>::new()).unwrap_err();

        assert!(matches!(err, Error::NotPerfectSquare { count: 3, .. }));
        assert!(err.to_string().contains(&config.input_folder.display().to_string()));
        assert!(runner.calls.lock().unwrap().is_empty());
        assert!(!config.output_folder.exists());
    }

    #[test]
    fn test_run_without_sizes_is_empty_command() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        write_clips(&config.input_folder, &["a.mov", "b.mov", "c.mov", "d.mov"]);
        let durations = HashMap::from([("a.mov", 2.0), ("b.mov", 2.0), ("c.mov", 2.0), ("d.mov", 2.0)]);
        let runner = Arc::new(fake_tools(durations).on("ffprobe", |_| Ok(failed("no streams"))));
        let prober = Prober::new(runner.clone(), &config);

        let err = run(&config, &prober, Some("grid"), false, &mut Cursor::new(""), &mut Vec::<u8>::new())
            .unwrap_err();

        assert!(matches!(err, Error::EmptyCommand { count: 4 }));
        assert!(runner
            .calls_to("ffmpeg")
            .iter()
            .all(|c| !c.args.iter().any(|a| a == "-filter_complex")));
    }

    #[test]
    fn test_supplied_name_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        write_clips(&config.output_folder, &["taken.mov"]);

        assert!(matches!(
            supplied_output_path("taken", &config, false),
            Err(Error::OutputExists(_))
        ));
        assert_eq!(
            supplied_output_path("taken", &config, true).unwrap(),
            config.output_folder.join("taken.mov")
        );
        assert_eq!(
            supplied_output_path("fresh.mp4", &config, false).unwrap(),
            config.output_folder.join("fresh.mp4")
        );
    }

    #[test]
    fn test_opt_overrides_config() {
        let opt = Opt {
            input: Some(PathBuf::from("clips")),
            variant: Some(GridVariant::V2),
            no_match_resolution: true,
            nproc: Some(2),
            ..Opt::default()
        };
        let mut config = Config::default();

        opt.apply(&mut config);

        assert_eq!(config.input_folder, PathBuf::from("clips"));
        assert_eq!(config.output_folder, Config::default().output_folder);
        assert_eq!(config.variant, GridVariant::V2);
        assert!(!config.match_input_resolution);
        assert_eq!(config.nproc, 2);
    }
}
