use chrono::Datelike;
use incb_viz::charts::TickCounts;
use incb_viz::charts::histogram::HistogramChart;
use incb_viz::charts::map::{MapChart, MapRequest, map_regions};
use incb_viz::charts::scatter::{ScatterChart, filter_scatter};
use incb_viz::charts::timeseries::{CountrySeriesChart, RegionSeriesChart};
use incb_viz::hover::{HoverEffect, HoverPhase};
use incb_viz::palette::{self, BASE_FILL, NEUTRAL_FILL};
use incb_viz::reshape::reshape_to_series;
use incb_viz::scale;
use incb_viz::surface::{MarkKind, SurfaceOp};
use incb_viz::{CountryProfile, GeoFeature, HistogramPoint, ScatterPoint, Scene};
use serde_json::json;

fn profiles() -> Vec<CountryProfile> {
    serde_json::from_value(json!([
        {
            "static": { "country": "Chile", "iso3": "CHL", "json_country": "Chile",
                        "region": "Americas", "subregion": "South America" },
            "ts": { "years": [2000, 2001, 2002],
                    "morphine": [1.0, 2.0, 4.0],
                    "codeine": [0.5, null, 0.25] }
        },
        {
            "static": { "country": "Peru", "iso3": "PER", "json_country": "Peru",
                        "region": "Americas", "subregion": "South America" },
            "ts": { "years": [2000, 2001, 2002],
                    "morphine": [0.01, 0.02, null],
                    "codeine": [0.2, 0.3, 0.4] }
        }
    ]))
    .unwrap()
}

fn features(names: &[&str]) -> Vec<GeoFeature> {
    names
        .iter()
        .map(|n| GeoFeature {
            name: n.to_string(),
            shape: Some(format!("M{n}")),
        })
        .collect()
}

fn strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

#[test]
fn map_colors_by_threshold_and_marks_missing_countries_neutral() {
    let profiles = profiles();
    let features = features(&["Chile", "Peru", "Atlantis"]);
    let colors = scale::drug_threshold("morphine").unwrap();
    let req = MapRequest {
        features: &features,
        profiles: &profiles,
        drug: "morphine",
        year: 2002,
    };

    let regions = map_regions(&req).unwrap();
    assert_eq!(regions[0].value, Some(4.0));
    assert_eq!(regions[1].value, None);

    let mut scene = Scene::new();
    let mut map = MapChart::default();
    let report = map.update(&mut scene, &req, &colors).unwrap();
    assert_eq!(report.entered.len(), 3);

    // regions start from the base fill
    assert_eq!(scene.find("Chile").unwrap().attrs.fill, Some(BASE_FILL));
    scene.finish();

    let chile = scene.find("Chile").unwrap();
    assert_eq!(chile.kind, MarkKind::Region);
    assert_eq!(chile.attrs.fill, Some(colors.apply(4.0)));
    assert_eq!(chile.attrs.shape.as_deref(), Some("MChile"));
    // Peru has a profile but no 2002 value
    assert_eq!(scene.find("Peru").unwrap().attrs.fill, Some(NEUTRAL_FILL));
    assert_eq!(scene.find("Atlantis").unwrap().attrs.fill, Some(NEUTRAL_FILL));
}

#[test]
fn map_recolor_keeps_region_elements() {
    let profiles = profiles();
    let features = features(&["Chile", "Peru"]);
    let colors = scale::drug_threshold("morphine").unwrap();
    let mut scene = Scene::new();
    let mut map = MapChart::default();

    let mut req = MapRequest {
        features: &features,
        profiles: &profiles,
        drug: "morphine",
        year: 2000,
    };
    map.update(&mut scene, &req, &colors).unwrap();
    let id = scene.find("Peru").unwrap().id;
    scene.finish();

    req.year = 2001;
    let report = map.update(&mut scene, &req, &colors).unwrap();
    assert!(report.is_stable());
    assert_eq!(scene.find("Peru").unwrap().id, id);
    scene.finish();
    assert_eq!(scene.find("Peru").unwrap().attrs.fill, Some(colors.apply(0.02)));
    assert_eq!(scene.count(MarkKind::Region), 2);
}

#[test]
fn map_hover_forwards_country_and_title() {
    let profiles = profiles();
    let features = features(&["Chile", "Atlantis"]);
    let colors = scale::drug_threshold("codeine").unwrap();
    let req = MapRequest {
        features: &features,
        profiles: &profiles,
        drug: "codeine",
        year: 2000,
    };
    let mut scene = Scene::new();
    MapChart::default().update(&mut scene, &req, &colors).unwrap();
    scene.finish();

    let chile = scene.find("Chile").unwrap().id;
    let effects = scene.hover(chile, HoverPhase::Over);
    assert!(effects.contains(&HoverEffect::ShowCountrySeries {
        country: "Chile".into(),
        drug: None,
    }));
    assert!(effects.contains(&HoverEffect::SetTitle {
        title: "Chile".into()
    }));
    assert_eq!(scene.node(chile).unwrap().attrs.fill_opacity, Some(1.0));

    scene.hover(chile, HoverPhase::Out);
    assert_eq!(scene.node(chile).unwrap().attrs.fill_opacity, Some(0.9));

    let atlantis = scene.find("Atlantis").unwrap().id;
    let effects = scene.hover(atlantis, HoverPhase::Over);
    assert_eq!(effects.len(), 1);
}

#[test]
fn map_hover_during_recolor_leaves_fill_transition_running() {
    let profiles = profiles();
    let features = features(&["Chile"]);
    let colors = scale::drug_threshold("morphine").unwrap();
    let req = MapRequest {
        features: &features,
        profiles: &profiles,
        drug: "morphine",
        year: 2002,
    };
    let mut scene = Scene::new();
    MapChart::default().update(&mut scene, &req, &colors).unwrap();
    scene.advance(100);
    let chile = scene.find("Chile").unwrap().id;
    let mid_fill = scene.node(chile).unwrap().attrs.fill;
    assert_ne!(mid_fill, Some(colors.apply(4.0)));

    scene.hover(chile, HoverPhase::Over);
    let node = scene.node(chile).unwrap();
    assert_eq!(node.attrs.fill, mid_fill);
    assert_eq!(node.attrs.fill_opacity, Some(1.0));
    assert!(node.animation.is_some());

    scene.finish();
    let node = scene.node(chile).unwrap();
    assert_eq!(node.attrs.fill, Some(colors.apply(4.0)));
    assert_eq!(node.attrs.fill_opacity, Some(1.0));
}

fn scatter_point(country: &str, drug: &str, x: f64, y: f64, region: &str) -> ScatterPoint {
    ScatterPoint {
        country: country.into(),
        drug: drug.into(),
        x,
        y,
        iso3: country[..3].to_uppercase(),
        json_country: Some(country.into()),
        region: Some(region.into()),
        year: None,
    }
}

#[test]
fn scatter_places_iso3_labels_with_reversed_x() {
    let all = vec![
        scatter_point("Chile", "morphine", 0.0, 0.0, "Americas"),
        scatter_point("Peru", "morphine", 10.0, 5.0, "Americas"),
        scatter_point("France", "codeine", 5.0, 10.0, "Europe"),
    ];
    let shown = filter_scatter(
        &all,
        &strings(&["morphine", "codeine"]),
        &strings(&["Americas"]),
        None,
    );
    assert_eq!(shown.len(), 2);

    let mut scene = Scene::new();
    let mut chart = ScatterChart::default();
    chart.update(&mut scene, &shown, scale::drug_colors()).unwrap();
    scene.finish();

    let chile = scene.find("morphine_Chile").unwrap();
    let peru = scene.find("morphine_Peru").unwrap();
    assert_eq!(chile.kind, MarkKind::Text);
    assert_eq!(chile.attrs.text.as_deref(), Some("CHI"));
    // x runs right to left
    assert_eq!(chile.attrs.x, Some(580.0));
    assert_eq!(peru.attrs.x, Some(60.0));
    assert_eq!(chile.attrs.y, Some(340.0));
    assert_eq!(peru.attrs.y, Some(20.0));
    assert_eq!(chile.attrs.fill, Some(palette::DRUG_COLORS[3]));
    assert_eq!(chile.attrs.opacity, Some(0.6));
}

#[test]
fn scatter_axes_retick_on_every_redraw() {
    let all = vec![
        scatter_point("Chile", "morphine", 0.0, 0.0, "Americas"),
        scatter_point("Peru", "morphine", 10.0, 5.0, "Americas"),
        scatter_point("France", "morphine", 5.0, 10.0, "Europe"),
    ];
    let drugs = strings(&["morphine"]);
    let mut scene = Scene::new();
    let mut chart = ScatterChart::default();
    assert!(chart.axes().x.is_empty());

    let first = filter_scatter(&all, &drugs, &strings(&["Americas"]), None);
    chart.update(&mut scene, &first, scale::drug_colors()).unwrap();
    let x = &chart.axes().x;
    assert_eq!(x.len(), 11);
    // values ascend while the reversed axis runs right to left
    assert_eq!((x[0].value, x[0].position), (0.0, 580.0));
    assert_eq!((x[10].value, x[10].position), (10.0, 60.0));
    assert_eq!(chart.axes().y.last().map(|t| t.value), Some(5.0));

    chart.ticks = TickCounts::new(2, 2);
    let second = vec![all[0].clone(), all[2].clone()];
    chart.update(&mut scene, &second, scale::drug_colors()).unwrap();
    let x: Vec<f64> = chart.axes().x.iter().map(|t| t.value).collect();
    assert_eq!(x, vec![0.0, 2.0, 4.0]);
    let y: Vec<f64> = chart.axes().y.iter().map(|t| t.value).collect();
    assert_eq!(y, vec![0.0, 5.0, 10.0]);
}

#[test]
fn scatter_filter_change_moves_survivors() {
    let all = vec![
        scatter_point("Chile", "morphine", 0.0, 0.0, "Americas"),
        scatter_point("Peru", "morphine", 10.0, 5.0, "Americas"),
        scatter_point("France", "morphine", 5.0, 10.0, "Europe"),
    ];
    let drugs = strings(&["morphine"]);
    let mut scene = Scene::new();
    let mut chart = ScatterChart::default();

    let first = filter_scatter(&all, &drugs, &strings(&["Americas"]), None);
    chart.update(&mut scene, &first, scale::drug_colors()).unwrap();
    scene.finish();
    let chile_id = scene.find("morphine_Chile").unwrap().id;

    let second = filter_scatter(&all, &drugs, &strings(&["Americas", "Europe"]), None);
    let report = chart.update(&mut scene, &second, scale::drug_colors()).unwrap();
    assert_eq!(report.entered.len(), 1);
    assert_eq!(report.updated.len(), 2);
    assert!(report.exited.is_empty());
    assert_eq!(scene.find("morphine_Chile").unwrap().id, chile_id);
    assert_eq!(chart.labels().len(), 3);
}

#[test]
fn scatter_label_hover_grows_and_opens_country() {
    let shown = vec![
        scatter_point("Chile", "morphine", 0.0, 0.0, "Americas"),
        scatter_point("Peru", "morphine", 1.0, 1.0, "Americas"),
    ];
    let mut scene = Scene::new();
    ScatterChart::default()
        .update(&mut scene, &shown, scale::drug_colors())
        .unwrap();
    scene.finish();

    let id = scene.find("morphine_Peru").unwrap().id;
    let effects = scene.hover(id, HoverPhase::Over);
    assert!(effects.contains(&HoverEffect::ShowCountrySeries {
        country: "Peru".into(),
        drug: Some("morphine".into()),
    }));
    scene.finish();
    assert_eq!(scene.node(id).unwrap().attrs.font_size, Some(15.0));
    assert_eq!(scene.node(id).unwrap().attrs.opacity, Some(1.0));

    scene.hover(id, HoverPhase::Out);
    scene.finish();
    assert_eq!(scene.node(id).unwrap().attrs.font_size, Some(10.0));
    assert_eq!(scene.node(id).unwrap().attrs.opacity, Some(0.6));
}

fn dot(bin: &str, drug: &str, country: &str, value: f64) -> HistogramPoint {
    HistogramPoint {
        bin: bin.into(),
        rank: 0,
        series_key: drug.into(),
        value,
        cognostic: "mean".into(),
        region: Some("Americas".into()),
        subregion: None,
        group_key: country.into(),
        json_country: Some(country.into()),
    }
}

#[test]
fn histogram_stacks_dots_by_rank_within_bins() {
    let levels = strings(&["[0,1)", "[1,2)", "[2,3)", "[3,4)"]);
    let points = vec![
        dot("[1,2)", "morphine", "Chile", 1.8),
        dot("[1,2)", "morphine", "Peru", 1.2),
        dot("[3,4)", "codeine", "Chile", 3.5),
    ];
    let mut scene = Scene::new();
    let mut chart = HistogramChart::default();
    let report = chart
        .update(&mut scene, &points, &levels, scale::drug_colors())
        .unwrap();
    assert_eq!(report.entered.len(), 3);
    // new dots start at rank zero
    assert_eq!(scene.find("morphine_Chile").unwrap().attrs.x, Some(70.0));
    scene.finish();

    let peru = scene.find("morphine_Peru").unwrap();
    let chile = scene.find("morphine_Chile").unwrap();
    assert_eq!(peru.kind, MarkKind::Circle);
    assert_eq!(peru.attrs.x, Some(70.0));
    assert_eq!(chile.attrs.x, Some(580.0));
    assert_eq!(peru.attrs.y, chile.attrs.y);
    // occupied span [1,2) .. [3,4): three slots bottom to top
    assert_eq!(chile.attrs.y, Some(380.0));
    assert_eq!(scene.find("codeine_Chile").unwrap().attrs.y, Some(20.0));
    assert_eq!(chile.attrs.r, Some(2.0));
}

#[test]
fn histogram_single_dots_stay_on_the_left_edge() {
    let levels = strings(&["[0,1)", "[1,2)"]);
    let mut points = vec![
        dot("[0,1)", "morphine", "Chile", 0.5),
        dot("[1,2)", "codeine", "Peru", 1.5),
    ];
    let mut scene = Scene::new();
    let mut chart = HistogramChart::default();
    chart
        .update(&mut scene, &points, &levels, scale::drug_colors())
        .unwrap();
    scene.finish();
    assert_eq!(scene.find("morphine_Chile").unwrap().attrs.x, Some(70.0));
    assert_eq!(scene.find("codeine_Peru").unwrap().attrs.x, Some(70.0));

    // a second dot in a bin spreads the axis; rank-0 dots stay put
    points.push(dot("[0,1)", "morphine", "Peru", 0.7));
    chart
        .update(&mut scene, &points, &levels, scale::drug_colors())
        .unwrap();
    scene.finish();
    assert_eq!(scene.find("morphine_Chile").unwrap().attrs.x, Some(70.0));
    assert_eq!(scene.find("codeine_Peru").unwrap().attrs.x, Some(70.0));
    assert_eq!(scene.find("morphine_Peru").unwrap().attrs.x, Some(580.0));
}

#[test]
fn histogram_removes_dots_that_leave_the_selection() {
    let levels = strings(&["[0,1)", "[1,2)"]);
    let points = vec![
        dot("[0,1)", "morphine", "Chile", 0.5),
        dot("[1,2)", "codeine", "Peru", 1.5),
    ];
    let mut scene = Scene::new();
    let mut chart = HistogramChart::default();
    chart
        .update(&mut scene, &points, &levels, scale::drug_colors())
        .unwrap();
    scene.take_ops();

    let report = chart
        .update(&mut scene, &points[..1], &levels, scale::drug_colors())
        .unwrap();
    assert_eq!(report.exited.len(), 1);
    assert!(scene.find("codeine_Peru").is_none());
    assert!(
        scene
            .ops()
            .iter()
            .any(|op| matches!(op, SurfaceOp::Destroy { transition: None, .. }))
    );
    assert_eq!(chart.dots().len(), 1);
}

#[test]
fn country_panel_rises_from_zero_and_emphasizes_focus() {
    let series = reshape_to_series(&profiles()).unwrap();
    let mut scene = Scene::new();
    let mut chart = CountrySeriesChart::default();
    let report = chart
        .update(&mut scene, &series, "Chile", Some("morphine"), scale::drug_colors())
        .unwrap();
    // morphine 3 + codeine 2 observations, two lines
    assert_eq!(report.points.entered.len(), 5);
    assert_eq!(report.lines.entered.len(), 2);
    assert!(report.labels.is_none());

    // y range is (400 - 30, 15); domain is 0..4 from the focused drug
    let p = scene.find("point_2002_morphine").unwrap();
    assert_eq!(p.attrs.y, Some(370.0));
    assert_eq!(p.attrs.opacity, Some(0.0));
    scene.finish();

    let p = scene.find("point_2002_morphine").unwrap();
    assert_eq!(p.attrs.y, Some(15.0));
    assert_eq!(p.attrs.x, Some(505.0));
    assert_eq!(p.attrs.r, Some(2.25));
    assert_eq!(scene.find("point_2000_codeine").unwrap().attrs.r, Some(0.75));

    let morphine = scene.find("series_morphine_Chile").unwrap();
    assert_eq!(morphine.kind, MarkKind::Path);
    assert_eq!(morphine.attrs.stroke_width, Some(1.0));
    assert_eq!(morphine.attrs.points.as_ref().map(Vec::len), Some(3));
    let codeine = scene.find("series_codeine_Chile").unwrap();
    assert_eq!(codeine.attrs.stroke_width, Some(0.2));
    assert_eq!(codeine.attrs.points.as_ref().map(Vec::len), Some(2));
}

#[test]
fn country_switch_replaces_marks() {
    let series = reshape_to_series(&profiles()).unwrap();
    let mut scene = Scene::new();
    let mut chart = CountrySeriesChart::default();
    chart
        .update(&mut scene, &series, "Chile", None, scale::drug_colors())
        .unwrap();
    scene.finish();

    let report = chart
        .update(&mut scene, &series, "Peru", None, scale::drug_colors())
        .unwrap();
    // point keys ignore the country, so shared (year, drug) pairs survive
    assert_eq!(report.points.updated.len(), 4);
    assert_eq!(report.points.exited.len(), 1);
    assert_eq!(report.lines.exited.len(), 2);
    assert_eq!(report.lines.entered.len(), 2);
    scene.finish();
    assert!(scene.find("series_morphine_Chile").is_none());
    assert!(scene.find("series_codeine_Peru").is_some());
    // without focus no line is thickened
    assert_eq!(
        scene.find("series_morphine_Peru").unwrap().attrs.stroke_width,
        Some(0.2)
    );
}

#[test]
fn regions_panel_draws_labels_at_line_ends() {
    let series = reshape_to_series(&profiles()).unwrap();
    let mut scene = Scene::new();
    let mut chart = RegionSeriesChart::default();
    let report = chart
        .update(
            &mut scene,
            &series,
            &strings(&["Chile", "Peru"]),
            &strings(&["morphine"]),
            scale::drug_colors(),
        )
        .unwrap();
    assert_eq!(report.lines.entered.len(), 2);
    assert_eq!(report.points.entered.len(), 5);
    assert_eq!(report.labels.as_ref().map(|l| l.entered.len()), Some(2));
    scene.finish();

    let label = scene.find("label_morphine_Peru").unwrap();
    assert_eq!(label.kind, MarkKind::Text);
    assert_eq!(label.attrs.text.as_deref(), Some("PER"));
    // Peru's last morphine value is 2001; x range is (75, 450)
    let x_2001 = scene.find("point_2001_morphine_Peru").unwrap().attrs.x.unwrap();
    assert_eq!(label.attrs.x, Some(x_2001 + 10.0));
    assert_eq!(chart.labels().len(), 2);
    assert_eq!(chart.points().len(), 5);
}

#[test]
fn time_series_axes_tick_years_and_values() {
    let series = reshape_to_series(&profiles()).unwrap();
    let mut scene = Scene::new();
    let mut country = CountrySeriesChart::default();
    assert_eq!(country.ticks, TickCounts::new(4, 5));
    country
        .update(&mut scene, &series, "Chile", None, scale::drug_colors())
        .unwrap();
    let axes = country.axes();
    let years: Vec<i32> = axes.x.iter().map(|t| t.value.year()).collect();
    assert_eq!(years, vec![2000, 2001, 2002]);
    assert_eq!(axes.x[0].position, 70.0);
    assert_eq!(axes.x[2].position, 505.0);
    let values: Vec<f64> = axes.y.iter().map(|t| t.value).collect();
    assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(axes.y[0].position, 370.0);
    assert_eq!(axes.y[4].position, 15.0);

    let mut regions = RegionSeriesChart::default();
    assert_eq!(regions.ticks, TickCounts::new(5, 9));
    regions
        .update(
            &mut scene,
            &series,
            &strings(&["Chile", "Peru"]),
            &strings(&["morphine"]),
            scale::drug_colors(),
        )
        .unwrap();
    let axes = regions.axes();
    assert_eq!(axes.x.len(), 3);
    assert_eq!(axes.y.len(), 9);
    assert_eq!(axes.y[1].value, 0.5);
    assert_eq!(axes.y[8].value, 4.0);
    assert_eq!(axes.y[8].position, 40.0);
}

#[test]
fn trend_line_hover_enlarges_its_label() {
    let series = reshape_to_series(&profiles()).unwrap();
    let mut scene = Scene::new();
    let mut chart = RegionSeriesChart::default();
    chart
        .update(
            &mut scene,
            &series,
            &strings(&["Chile"]),
            &strings(&["codeine"]),
            scale::drug_colors(),
        )
        .unwrap();
    scene.finish();

    let line = scene.find("series_codeine_Chile").unwrap().id;
    let effects = scene.hover(line, HoverPhase::Over);
    assert_eq!(
        effects,
        vec![HoverEffect::SetTitle {
            title: "Chile".into()
        }]
    );
    scene.finish();
    assert_eq!(scene.node(line).unwrap().attrs.stroke_width, Some(1.5));
    assert_eq!(
        scene.find("label_codeine_Chile").unwrap().attrs.font_size,
        Some(18.0)
    );

    scene.hover(line, HoverPhase::Out);
    scene.finish();
    assert_eq!(scene.node(line).unwrap().attrs.stroke_width, Some(0.75));
    assert_eq!(
        scene.find("label_codeine_Chile").unwrap().attrs.font_size,
        Some(14.0)
    );
}

#[test]
fn duplicate_scatter_rows_fail_the_redraw() {
    let shown = vec![
        scatter_point("Chile", "morphine", 0.0, 0.0, "Americas"),
        scatter_point("Chile", "morphine", 1.0, 1.0, "Americas"),
    ];
    let mut scene = Scene::new();
    let err = ScatterChart::default()
        .update(&mut scene, &shown, scale::drug_colors())
        .unwrap_err();
    assert!(err.to_string().contains("morphine_Chile"));
    assert!(scene.is_empty());
}
