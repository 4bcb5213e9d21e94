use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use incb_viz::charts::Frame;
use incb_viz::charts::histogram::HistogramChart;
use incb_viz::charts::map::{MapChart, MapRequest};
use incb_viz::charts::scatter::{ScatterChart, filter_scatter};
use incb_viz::charts::timeseries::{CountrySeriesChart, RegionSeriesChart};
use incb_viz::cognostics::{
    CognosticRecord, bin_lower_endpoint, filter_cognostics, flatten_cognostics,
};
use incb_viz::config::PaletteConfig;
use incb_viz::rank::assign_ranks;
use incb_viz::reshape::{SeriesFilter, reshape_to_series};
use incb_viz::{
    CountryProfile, GeoFeature, HistogramPoint, ScatterPoint, Scene, SeriesPoint, storage,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "incb",
    version,
    about = "Reshape INCB consumption data and render dashboard charts to scene snapshots"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten country records into one row per (country, drug, year).
    Reshape(ReshapeArgs),
    /// Rank cognostic rows within their bins.
    Ranks(RanksArgs),
    /// Run one chart against an in-memory scene and write its JSON snapshot.
    Scene(SceneArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChartKind {
    Map,
    Scatter,
    Histogram,
    Country,
    Regions,
}

#[derive(Args, Debug)]
struct ReshapeArgs {
    /// Country records (JSON array of {"static": ..., "ts": ...}).
    #[arg(short, long)]
    input: PathBuf,
    /// Keep only this country (display name).
    #[arg(long)]
    country: Option<String>,
    /// Drugs separated by comma or semicolon.
    #[arg(long)]
    drugs: Option<String>,
    /// Save to file (format inferred by --format or extension); CSV on stdout otherwise.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

#[derive(Args, Debug)]
struct RanksArgs {
    /// Cognostic rows (JSON array of arrays).
    #[arg(short, long)]
    input: PathBuf,
    /// Keep only this cognostic.
    #[arg(long)]
    cognostic: Option<String>,
}

#[derive(Args, Debug)]
struct SceneArgs {
    #[arg(long, value_enum)]
    chart: ChartKind,
    /// Country records (map, country and regions charts).
    #[arg(long)]
    profiles: Option<PathBuf>,
    /// Geographic features [{"name": ..., "shape": ...}]; defaults to one per profile.
    #[arg(long)]
    features: Option<PathBuf>,
    /// Scatter rows (MDS or local regression).
    #[arg(long)]
    scatter: Option<PathBuf>,
    /// Cognostic rows (JSON array of arrays).
    #[arg(long)]
    cognostics: Option<PathBuf>,
    /// Bin levels per cognostic ({"name": ["[0,1)", ...]}).
    #[arg(long)]
    levels: Option<PathBuf>,
    #[arg(long)]
    cognostic: Option<String>,
    /// Selected (map) or focused (country) drug.
    #[arg(long)]
    drug: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    /// Country display name (country chart).
    #[arg(long)]
    country: Option<String>,
    /// Geographic country names separated by comma or semicolon (regions chart).
    #[arg(long)]
    countries: Option<String>,
    /// Drugs separated by comma or semicolon; defaults to every configured drug.
    #[arg(long)]
    drugs: Option<String>,
    /// Regions separated by comma or semicolon; defaults to every region in the data.
    #[arg(long)]
    regions: Option<String>,
    /// Palette override file.
    #[arg(long)]
    palette: Option<PathBuf>,
    #[arg(long, default_value_t = 600.0)]
    width: f64,
    #[arg(long, default_value_t = 400.0)]
    height: f64,
    /// Write the snapshot here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn required<'a, T: ?Sized>(value: Option<&'a T>, flag: &str) -> Result<&'a T> {
    match value {
        Some(v) => Ok(v),
        None => bail!("{flag} is required for this chart"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Reshape(args) => cmd_reshape(args),
        Command::Ranks(args) => cmd_ranks(args),
        Command::Scene(args) => cmd_scene(args),
    }
}

fn cmd_reshape(args: ReshapeArgs) -> Result<()> {
    let profiles: Vec<CountryProfile> = storage::load_json(&args.input)?;
    let series = reshape_to_series(&profiles)?;
    let drugs = args.drugs.as_deref().map(parse_list);
    let filter = SeriesFilter {
        country: args.country.as_deref(),
        drugs: drugs.as_deref(),
        ..SeriesFilter::default()
    };
    let points: Vec<SeriesPoint> = filter
        .series(&series)
        .into_iter()
        .flat_map(|s| s.points)
        .collect();

    let Some(path) = args.out.as_ref() else {
        return storage::write_csv(&points, std::io::stdout().lock());
    };
    let fmt = match args.format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    match fmt.as_str() {
        "csv" => storage::save_csv(&points, path)?,
        "json" => storage::save_json(&points, path)?,
        other => bail!("unsupported format: {}", other),
    }
    eprintln!("Saved {} rows to {}", points.len(), path.display());
    Ok(())
}

fn cmd_ranks(args: RanksArgs) -> Result<()> {
    let nested: Vec<Vec<CognosticRecord>> = storage::load_json(&args.input)?;
    let mut points = flatten_cognostics(&nested);
    if let Some(c) = &args.cognostic {
        points.retain(|p| &p.cognostic == c);
    }
    // bin labels repeat across cognostics
    assign_ranks(&mut points, |p| (p.cognostic.clone(), p.bin.clone()));

    let mut out = std::io::stdout().lock();
    writeln!(out, "cognostic\tbin\trank\tdrug\tcountry\tvalue")?;
    for p in &points {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            p.cognostic, p.bin, p.rank, p.series_key, p.group_key, p.value
        )?;
    }
    Ok(())
}

fn load_palette(path: Option<&Path>) -> Result<PaletteConfig> {
    let Some(path) = path else {
        return Ok(PaletteConfig::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    PaletteConfig::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Distinct bins of one cognostic's points, ordered by lower endpoint.
fn levels_from_points(points: &[HistogramPoint], cognostic: &str) -> Vec<String> {
    let mut bins: Vec<String> = points
        .iter()
        .filter(|p| p.cognostic == cognostic)
        .map(|p| p.bin.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    bins.sort_by(|a, b| {
        let a = bin_lower_endpoint(a).unwrap_or(f64::INFINITY);
        let b = bin_lower_endpoint(b).unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    bins
}

fn regions_or_all<'a>(
    selected: Option<&str>,
    present: impl Iterator<Item = Option<&'a String>>,
) -> Vec<String> {
    match selected {
        Some(s) => parse_list(s),
        None => present
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    }
}

fn cmd_scene(args: SceneArgs) -> Result<()> {
    let palette = load_palette(args.palette.as_deref())?;
    let colors = palette.drug_colors()?;
    let drugs = args
        .drugs
        .as_deref()
        .map(parse_list)
        .unwrap_or_else(|| palette.drugs.clone());
    let frame = Frame::new(args.width, args.height);
    let mut scene = Scene::new();

    match args.chart {
        ChartKind::Map => {
            let profiles: Vec<CountryProfile> =
                storage::load_json(required(args.profiles.as_deref(), "--profiles")?)?;
            let features: Vec<GeoFeature> = match args.features.as_deref() {
                Some(p) => storage::load_json(p)?,
                None => profiles
                    .iter()
                    .map(|p| GeoFeature {
                        name: p.info.json_country.clone(),
                        shape: None,
                    })
                    .collect(),
            };
            let drug = required(args.drug.as_deref(), "--drug")?;
            let year = *required(args.year.as_ref(), "--year")?;
            let thresholds = palette.threshold_for(drug)?;
            let req = MapRequest {
                features: &features,
                profiles: &profiles,
                drug,
                year,
            };
            MapChart::default().update(&mut scene, &req, &thresholds)?;
        }
        ChartKind::Scatter => {
            let points: Vec<ScatterPoint> =
                storage::load_json(required(args.scatter.as_deref(), "--scatter")?)?;
            let regions = regions_or_all(
                args.regions.as_deref(),
                points.iter().map(|p| p.region.as_ref()),
            );
            let shown = filter_scatter(&points, &drugs, &regions, args.year);
            let mut chart = ScatterChart::default();
            chart.frame = frame;
            chart.update(&mut scene, &shown, colors)?;
        }
        ChartKind::Histogram => {
            let nested: Vec<Vec<CognosticRecord>> =
                storage::load_json(required(args.cognostics.as_deref(), "--cognostics")?)?;
            let cognostic = required(args.cognostic.as_deref(), "--cognostic")?;
            let points = flatten_cognostics(&nested);
            let regions = regions_or_all(
                args.regions.as_deref(),
                points.iter().map(|p| p.region.as_ref()),
            );
            let levels = match args.levels.as_deref() {
                Some(p) => {
                    let mut all: BTreeMap<String, Vec<String>> = storage::load_json(p)?;
                    all.remove(cognostic)
                        .with_context(|| format!("no levels for cognostic {cognostic}"))?
                }
                None => levels_from_points(&points, cognostic),
            };
            let shown = filter_cognostics(&points, cognostic, &drugs, &regions);
            let mut chart = HistogramChart::default();
            chart.frame = frame;
            chart.update(&mut scene, &shown, &levels, colors)?;
        }
        ChartKind::Country => {
            let profiles: Vec<CountryProfile> =
                storage::load_json(required(args.profiles.as_deref(), "--profiles")?)?;
            let country = required(args.country.as_deref(), "--country")?;
            let series = reshape_to_series(&profiles)?;
            let mut chart = CountrySeriesChart::default();
            chart.frame = frame;
            chart.update(&mut scene, &series, country, args.drug.as_deref(), colors)?;
        }
        ChartKind::Regions => {
            let profiles: Vec<CountryProfile> =
                storage::load_json(required(args.profiles.as_deref(), "--profiles")?)?;
            let countries = parse_list(required(args.countries.as_deref(), "--countries")?);
            let series = reshape_to_series(&profiles)?;
            let mut chart = RegionSeriesChart::default();
            chart.frame = frame;
            chart.update(&mut scene, &series, &countries, &drugs, colors)?;
        }
    }

    scene.finish();
    let json = scene.to_json()?;
    match args.out.as_ref() {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Wrote {} marks to {}", scene.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
