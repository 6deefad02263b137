use clap::{Parser, ValueEnum};
use dicom_crossref::{
    LoadOptions, LoadedSeries, OverlayMode, OverlayRenderer, OverlayStyle, RelationTolerances,
    Selection, SeriesLoader, SortBy, ViewState, Viewer,
};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process;

/// Draw cross-reference lines or field-of-view boxes between two DICOM series
#[derive(Parser, Debug)]
#[command(name = "dicom-crossref")]
#[command(version)]
struct Cli {
    /// Folder searched recursively for DICOM files
    #[arg(value_name = "FOLDER")]
    folder: PathBuf,

    /// Print the loaded series and exit
    #[arg(long)]
    list: bool,

    /// Left viewer selection as SERIES:SLICE (zero based)
    #[arg(long, value_parser = parse_selection)]
    left: Option<Selection>,

    /// Right viewer selection as SERIES:SLICE (zero based)
    #[arg(long, value_parser = parse_selection)]
    right: Option<Selection>,

    #[arg(short, long, default_value = "cross-reference")]
    mode: ModeArg,

    #[arg(long, default_value_t = 1.0)]
    left_zoom: f64,

    #[arg(long, default_value_t = 1.0)]
    right_zoom: f64,

    /// Slice order inside each series
    #[arg(long, default_value = "position")]
    sort_by: SortByArg,

    #[arg(long, default_value_t = RelationTolerances::default().equality)]
    equality_tolerance: f64,

    #[arg(long, default_value_t = RelationTolerances::default().orthogonality)]
    orthogonality_tolerance: f64,

    /// Print the DICOM attributes of the selected slices
    #[arg(long)]
    tags: bool,

    /// Directory receiving left.png and right.png
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, ValueEnum)]
enum ModeArg {
    Off,
    CrossReference,
    Fov,
}

impl From<ModeArg> for OverlayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Off => OverlayMode::Off,
            ModeArg::CrossReference => OverlayMode::CrossReference,
            ModeArg::Fov => OverlayMode::FieldOfView,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum SortByArg {
    Position,
    Instance,
    None,
}

impl From<SortByArg> for SortBy {
    fn from(sort_by: SortByArg) -> Self {
        match sort_by {
            SortByArg::Position => SortBy::ImagePositionPatient,
            SortByArg::Instance => SortBy::InstanceNumber,
            SortByArg::None => SortBy::None,
        }
    }
}

fn parse_selection(value: &str) -> Result<Selection, String> {
    let (series, slice) = value
        .split_once(':')
        .ok_or_else(|| format!("expected SERIES:SLICE, got '{value}'"))?;
    let series = series
        .trim()
        .parse()
        .map_err(|e| format!("invalid series index '{series}': {e}"))?;
    let slice = slice
        .trim()
        .parse()
        .map_err(|e| format!("invalid slice index '{slice}': {e}"))?;
    Ok(Selection::new(series, slice))
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if !cli.folder.is_dir() {
        eprintln!("Error: {} is not a directory", cli.folder.display());
        process::exit(1);
    }

    let options = LoadOptions {
        sort_by: cli.sort_by.clone().into(),
        decode_images: !cli.list,
    };
    let series = match SeriesLoader::load_from_directory(&cli.folder, options) {
        Ok(series) => series,
        Err(e) => {
            error!("Failed to load {}: {}", cli.folder.display(), e);
            process::exit(1);
        }
    };

    if cli.list {
        print_series(&series);
        return;
    }

    if let Err(e) = render_viewers(&cli, &series) {
        error!("{e}");
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn print_series(series: &[LoadedSeries]) {
    for (index, loaded) in series.iter().enumerate() {
        println!("{}", describe_series(index, loaded));
    }
}

fn describe_series(index: usize, loaded: &LoadedSeries) -> String {
    let geometry = &loaded.geometry;
    let normal = geometry.slice_normal();
    format!(
        "{index}: {} \"{}\" {} slices, {}x{} px, {} mm thick, normal ({:.3}, {:.3}, {:.3})",
        geometry.series_id(),
        loaded.description,
        geometry.slice_count(),
        geometry.dim().0,
        geometry.dim().1,
        geometry.slice_thickness(),
        normal.x,
        normal.y,
        normal.z,
    )
}

fn render_viewers(cli: &Cli, series: &[LoadedSeries]) -> Result<(), Box<dyn std::error::Error>> {
    let tolerances = RelationTolerances {
        equality: cli.equality_tolerance,
        orthogonality: cli.orthogonality_tolerance,
    };
    let mut state = ViewState::new(tolerances)
        .with_zoom(Viewer::Left, cli.left_zoom)
        .with_zoom(Viewer::Right, cli.right_zoom)
        .with_mode(cli.mode.clone().into());
    for (viewer, selection) in [(Viewer::Left, cli.left), (Viewer::Right, cli.right)] {
        if let Some(selection) = selection {
            state = state.with_selection(viewer, selection);
        }
    }

    let geometries: Vec<_> = series.iter().map(|s| s.geometry.clone()).collect();
    let frame = state.compute_overlays(&geometries);
    if state.mode != OverlayMode::Off && frame.is_empty() {
        warn!("No overlay for this selection");
    }

    std::fs::create_dir_all(&cli.output)?;
    let style = OverlayStyle::default();
    for (viewer, name) in [(Viewer::Left, "left.png"), (Viewer::Right, "right.png")] {
        let viewer_state = state.viewer(viewer);
        let Some(selection) = viewer_state.selection else {
            continue;
        };
        let loaded = series
            .get(selection.series_index)
            .ok_or_else(|| format!("No series {} for {viewer:?} viewer", selection.series_index))?;
        let slice = loaded.slices.get(selection.slice_index).ok_or_else(|| {
            format!(
                "Slice {} out of range for series {} ({} slices)",
                selection.slice_index,
                selection.series_index,
                loaded.slices.len()
            )
        })?;

        if cli.tags {
            println!("== {viewer:?}: {}", slice.path.display());
            for line in SeriesLoader::describe_tags(&slice.path)? {
                println!("{line}");
            }
        }

        let image = OverlayRenderer::render(
            slice.image.as_ref(),
            &loaded.geometry.canvas(),
            frame.for_viewer(viewer),
            viewer_state.zoom,
            &style,
        );
        let path = cli.output.join(name);
        image.save(&path)?;
        info!(
            "Wrote {} with {} overlays",
            path.display(),
            frame.for_viewer(viewer).len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_crossref::SeriesGeometry;
    use dicom_crossref::math::{Point3, Vec3};

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("2:15"), Ok(Selection::new(2, 15)));
        assert_eq!(parse_selection(" 0 : 3 "), Ok(Selection::new(0, 3)));
        assert!(parse_selection("3").is_err());
        assert!(parse_selection("a:1").is_err());
        assert!(parse_selection("1:-1").is_err());
    }

    #[test]
    fn test_cli_parses_arguments() {
        let cli = Cli::try_parse_from([
            "dicom-crossref",
            "scans",
            "--left",
            "0:4",
            "--right",
            "1:0",
            "--mode",
            "fov",
            "--right-zoom",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.left, Some(Selection::new(0, 4)));
        assert!(matches!(cli.mode, ModeArg::Fov));
        assert_eq!(cli.right_zoom, 2.0);
        assert_eq!(cli.orthogonality_tolerance, 0.05);
    }

    #[test]
    fn test_describe_series() {
        let geometry = SeriesGeometry::new(
            "1.2.3",
            Vec3::x(),
            Vec3::z(),
            0.5,
            0.5,
            512,
            256,
            vec![Point3::new(0.0, -40.0, 0.0), Point3::new(0.0, -38.0, 0.0)],
        )
        .unwrap()
        .with_slice_thickness(2.5);
        let loaded = LoadedSeries {
            geometry,
            description: "COR T2".into(),
            slices: Vec::new(),
        };
        assert_eq!(
            describe_series(3, &loaded),
            "3: 1.2.3 \"COR T2\" 2 slices, 512x256 px, 2.5 mm thick, normal (0.000, -1.000, 0.000)"
        );
    }
}
