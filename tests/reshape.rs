use incb_viz::reshape::{
    CountryLookup, SeriesFilter, build_country_index, country_series, find_country,
    reshape_to_flat_points, reshape_to_series, sort_indices,
};
use incb_viz::{CountryProfile, VizError};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;

fn profile(
    country: &str,
    json_country: &str,
    years: serde_json::Value,
    morphine: serde_json::Value,
) -> CountryProfile {
    serde_json::from_value(json!({
        "static": {
            "country": country,
            "iso3": country[..3].to_uppercase(),
            "json_country": json_country,
            "region": "Americas",
            "subregion": "South America",
            "population": 1000
        },
        "ts": { "years": years, "morphine": morphine }
    }))
    .unwrap()
}

#[test]
fn unsorted_years_are_sorted_with_their_values() {
    let p = profile(
        "Chile",
        "Chile",
        json!(["2001-01-01", "2000-01-01", "2002-01-01"]),
        json!([5.0, 3.0, 9.0]),
    );
    let pts = reshape_to_flat_points(&[p]).unwrap();
    let got: Vec<(i32, f64)> = pts.iter().map(|p| (p.year(), p.y)).collect();
    assert_eq!(got, vec![(2000, 3.0), (2001, 5.0), (2002, 9.0)]);
    assert!(pts.iter().all(|p| p.series_key == "morphine" && p.country_key == "Chile"));
    assert_eq!(pts[0].region.subregion.as_deref(), Some("South America"));
}

#[test]
fn nulls_are_skipped_not_zeroed() {
    let p = profile("Chile", "Chile", json!([2000, 2001, 2002]), json!([1.0, null, 2.0]));
    let series = country_series(&p).unwrap();
    assert_eq!(series.len(), 1);
    let years: Vec<i32> = series[0].points.iter().map(|p| p.year()).collect();
    assert_eq!(years, vec![2000, 2002]);
    assert_eq!(series[0].key.to_string(), "morphine_Chile");
}

#[test]
fn mismatched_lengths_name_country_and_drug() {
    let p = profile("Chile", "Chile", json!([2000, 2001]), json!([1.0]));
    let err = reshape_to_series(&[p]).unwrap_err();
    assert_eq!(
        err,
        VizError::LengthMismatch {
            country: "Chile".into(),
            drug: "morphine".into(),
            years: 2,
            values: 1,
        }
    );
    assert!(err.to_string().contains("Chile"));
}

#[test]
fn one_point_per_present_observation_ascending() {
    let p = profile(
        "Peru",
        "Peru",
        json!(["2003", "2001", "2002", "2000"]),
        json!([4.0, 2.0, null, 1.0]),
    );
    let pts = reshape_to_flat_points(&[p]).unwrap();
    assert_eq!(pts.len(), 3);
    assert!(pts.windows(2).all(|w| w[0].x < w[1].x));
}

#[test]
fn sort_indices_is_stable() {
    assert_eq!(sort_indices(&[3, 1, 3, 0]), vec![3, 1, 0, 2]);
    assert!(sort_indices::<i32>(&[]).is_empty());
}

#[test]
fn value_at_aligns_by_year_not_position() {
    let p = profile("Chile", "Chile", json!([2002, 2000, 2001]), json!([9.0, 3.0, null]));
    assert_eq!(p.value_at("morphine", 2000).unwrap(), Some(3.0));
    assert_eq!(p.value_at("morphine", 2001).unwrap(), None);
    assert_eq!(p.value_at("morphine", 1999).unwrap(), None);
    assert_eq!(p.value_at("codeine", 2000).unwrap(), None);
}

#[test]
fn country_index_reports_missing_features_as_no_data() {
    let profiles = vec![
        profile("Bolivia (Plurinational State of)", "Bolivia", json!([2000]), json!([1.0])),
        profile("Chile", "Chile", json!([2000]), json!([1.0])),
    ];
    let index = build_country_index(&profiles, ["Bolivia", "Atlantis"]);
    assert_eq!(index.len(), 1);
    match index.lookup("Bolivia") {
        CountryLookup::Found(p) => assert_eq!(p.info.iso3, "BOL"),
        CountryLookup::NoData => panic!("Bolivia should match"),
    }
    assert_eq!(index.lookup("Atlantis"), CountryLookup::NoData);

    let m = find_country(&profiles, "Bolivia").unwrap();
    assert_eq!(m.index, 0);
    assert_eq!(m.country, "Bolivia (Plurinational State of)");
    assert!(find_country(&profiles, "Atlantis").is_none());
}

#[test]
fn filters_select_by_country_and_drug() {
    let profiles = vec![
        profile("Chile", "Chile", json!([2000, 2001]), json!([1.0, 2.0])),
        profile("Peru", "Peru", json!([2000]), json!([3.0])),
    ];
    let series = reshape_to_series(&profiles).unwrap();
    let pts = reshape_to_flat_points(&profiles).unwrap();

    let one = SeriesFilter {
        country: Some("Peru"),
        ..SeriesFilter::default()
    };
    assert_eq!(one.points(&pts).len(), 1);

    let countries = vec!["Chile".to_string()];
    let drugs = vec!["codeine".to_string()];
    let none = SeriesFilter {
        countries: Some(&countries),
        drugs: Some(&drugs),
        ..SeriesFilter::default()
    };
    assert!(none.series(&series).is_empty());

    let all = SeriesFilter::default();
    assert_eq!(all.series(&series).len(), 2);
}

#[test]
fn years_only_profile_contributes_nothing() {
    let p: CountryProfile = serde_json::from_value(json!({
        "static": { "country": "Nauru", "iso3": "NRU", "json_country": "Nauru" },
        "ts": { "years": [2000, 2001] }
    }))
    .unwrap();
    assert!(reshape_to_series(&[p.clone()]).unwrap().is_empty());
    assert!(reshape_to_flat_points(&[p]).unwrap().is_empty());
}

/// Years in random order, each paired with an optional value.
fn shuffled_years() -> impl Strategy<Value = Vec<(i32, Option<f64>)>> {
    (1usize..15).prop_flat_map(|n| {
        let years: Vec<i32> = (0..n as i32).map(|i| 1995 + i).collect();
        (
            Just(years).prop_shuffle(),
            prop::collection::vec(prop::option::of(0.0f64..500.0), n),
        )
            .prop_map(|(years, values)| years.into_iter().zip(values).collect())
    })
}

proptest! {
    #[test]
    fn any_year_order_comes_out_ascending_and_aligned(rows in shuffled_years()) {
        let years: Vec<i32> = rows.iter().map(|r| r.0).collect();
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.1).collect();
        let p = profile("Chile", "Chile", json!(years), json!(values));
        let pts = reshape_to_flat_points(&[p]).unwrap();

        let expected: BTreeMap<i32, f64> = rows
            .iter()
            .filter_map(|&(year, value)| value.map(|v| (year, v)))
            .collect();
        let got: Vec<(i32, f64)> = pts.iter().map(|p| (p.year(), p.y)).collect();
        prop_assert_eq!(got, expected.into_iter().collect::<Vec<_>>());
    }
}
