use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    probe::{Prober, Size},
    tools::ToolCommand,
};

/// Filter and encoder presets for the grid stitch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GridVariant {
    /// stretch every clip to the cell size, x264 ultrafast, audio copied
    #[default]
    V1,
    /// letterbox into the cell keeping aspect ratio, x264 veryfast crf 23, aac audio
    V2,
}

/// Side length of the square tile layout for `count` clips: `floor(sqrt(count))`.
pub fn grid_dimension(count: usize) -> usize {
    let mut dim = (count as f64).sqrt() as usize;
    while dim * dim > count {
        dim -= 1;
    }
    while (dim + 1) * (dim + 1) <= count {
        dim += 1;
    }
    dim
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub dimension: usize,
    pub cell: Size,
    pub output: Size,
}

impl GridLayout {
    pub fn new(count: usize, cell: Size, match_input_resolution: bool) -> Self {
        let dimension = grid_dimension(count);
        let output = if match_input_resolution {
            (cell.0 * dimension as u32, cell.1 * dimension as u32)
        } else {
            cell
        };
        GridLayout {
            dimension,
            cell,
            output,
        }
    }
}

/// Filter graph scaling each of the `count` inputs into a cell, stacking
/// `dimension` cells per row and all rows into `[vstack]`.
///
/// `count` is not checked against the layout; a non-square count leaves the
/// trailing inputs out of the rows.
pub fn filter_graph(layout: &GridLayout, count: usize, variant: GridVariant) -> String {
    let (w, h) = layout.cell;
    let dim = layout.dimension;
    let mut graph = String::new();

    for i in 0..count {
        match variant {
            GridVariant::V1 => graph += &format!("[{i}:v]scale={w}:{h}[v{i}]; "),
            GridVariant::V2 => {
                graph += &format!(
                    "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                     pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1[v{i}]; "
                )
            }
        }
    }
    for row in 0..dim {
        for col in 0..dim {
            graph += &format!("[v{}]", row * dim + col);
        }
        graph += &format!("hstack=inputs={dim}[row{row}]; ");
    }
    for row in 0..dim {
        graph += &format!("[row{row}]");
    }
    graph += &format!("vstack=inputs={dim}[vstack]");
    graph
}

/// Builds the ffmpeg invocation that tiles equalized clips into one video.
pub struct GridCommandBuilder<'a> {
    prober: &'a Prober,
    encoder: String,
    loglevel: String,
    variant: GridVariant,
    match_input_resolution: bool,
}

impl<'a> GridCommandBuilder<'a> {
    pub fn new(prober: &'a Prober, config: &Config) -> Self {
        GridCommandBuilder {
            prober,
            encoder: config.encoder.clone(),
            loglevel: config.loglevel.clone(),
            variant: config.variant,
            match_input_resolution: config.match_input_resolution,
        }
    }

    pub fn variant(mut self, variant: GridVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn match_input_resolution(mut self, flag: bool) -> Self {
        self.match_input_resolution = flag;
        self
    }

    /// `None` when there are no inputs or the first input has no readable size.
    pub fn build(&self, input_files: &[PathBuf], output_path: &Path) -> Option<ToolCommand> {
        let first = input_files.first()?;
        let Some(cell) = self.prober.size(first) else {
            warn!("Can't build grid command, no size for {}", first.display());
            return None;
        };
        let layout = GridLayout::new(input_files.len(), cell, self.match_input_resolution);

        let mut cmd = ToolCommand::new(&self.encoder).arg("-y");
        for input in input_files {
            cmd = cmd.arg("-i").arg(input);
        }
        cmd = cmd
            .arg("-filter_complex")
            .arg(filter_graph(&layout, input_files.len(), self.variant))
            .args(["-map", "[vstack]"]);
        for i in 0..input_files.len() {
            cmd = cmd.arg("-map").arg(format!("{i}:a"));
        }
        cmd = match self.variant {
            GridVariant::V1 => cmd.args(["-c:v", "libx264", "-preset", "ultrafast", "-c:a", "copy"]),
            GridVariant::V2 => cmd
                .args(["-c:v", "libx264", "-preset", "veryfast", "-crf", "23"])
                .args(["-c:a", "aac", "-b:a", "128k", "-threads", "0"]),
        };
        Some(
            cmd.args(["-loglevel", self.loglevel.as_str()])
                .arg("-s")
                .arg(format!("{}x{}", layout.output.0, layout.output.1))
                .arg(output_path),
        )
    }
}
