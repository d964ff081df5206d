#[cfg(test)]
mod tests {
    use crate::algorithms::timeseries::DEFAULT_HIGH_RISK_THRESHOLD;
    use crate::algorithms::{compute_snapshot, generate_time_series, snapshot_from_frame};
    use crate::core::domain::{
        AnalyzedRecord, AsteroidRecord, Measurements, RiskLevel, ScoredRecord, ZScores,
    };
    use crate::error::PipelineError;
    use crate::io::loaders::{load_analyzed_table, load_time_series_table, FeedLoader};
    use crate::io::tables::{write_analyzed_table, write_clean_table, write_time_series_table};
    use crate::parsing::neo_feed::NeoFeed;
    use chrono::NaiveDate;
    use polars::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn analyzed(day: u32, name: &str, risk: f64, anomaly: bool) -> AnalyzedRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        AnalyzedRecord {
            scored: ScoredRecord {
                asteroid: AsteroidRecord {
                    date,
                    id: format!("{}", 3_000_000 + day),
                    name: name.to_string(),
                    measurements: Measurements {
                        diameter_min_km: Some(0.1),
                        diameter_max_km: Some(0.3),
                        diameter_mean_km: Some(0.2),
                        miss_distance_km: Some(1_000_000.0 * day as f64),
                        relative_velocity_km_h: Some(36_000.0),
                        relative_velocity_km_s: Some(10.0),
                    },
                    is_potentially_hazardous: risk > 0.5,
                    close_approach_date: if name == "(2024 AA)" { None } else { Some(date) },
                },
                risk_score: risk,
                risk_level: RiskLevel::from_score(risk),
            },
            zscores: ZScores {
                risk_score_zscore: if anomaly { 2.5 } else { 0.1 },
                ..ZScores::default()
            },
            is_anomaly: anomaly,
        }
    }

    fn batch() -> Vec<AnalyzedRecord> {
        vec![
            analyzed(1, "(2024 AA)", 0.25, false),
            analyzed(1, "(2024 AB)", 0.75, true),
            analyzed(4, "433 Eros", 0.5, false),
        ]
    }

    /// Test that the analyzed table round-trips through CSV
    #[test]
    fn test_write_and_load_analyzed_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("asteroids_analyzed.csv");
        let records = batch();

        write_analyzed_table(&records, &path).unwrap();
        let df = load_analyzed_table(&path).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.get_column_names()[0].as_str(), "date");
        assert_eq!(df.column("risk_score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::String);

        let dates: Vec<Option<&str>> = df.column("date").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(dates[0], Some("2024-01-01"));
        let levels: Vec<Option<&str>> = df
            .column("risk_level")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(levels, vec![Some("Low"), Some("High"), Some("Medium")]);
        assert_eq!(df.column("close_approach_date").unwrap().null_count(), 1);

        let from_disk = snapshot_from_frame(&df, DEFAULT_HIGH_RISK_THRESHOLD).unwrap();
        let in_memory = compute_snapshot(&records, DEFAULT_HIGH_RISK_THRESHOLD);
        assert_eq!(from_disk.total_records, in_memory.total_records);
        assert_eq!(from_disk.first_date, in_memory.first_date);
        assert_eq!(from_disk.last_date, in_memory.last_date);
        assert_eq!(from_disk.anomaly_count, 1);
        assert_eq!(from_disk.hazardous_count, in_memory.hazardous_count);
        assert!((from_disk.mean_risk_score.unwrap() - 0.5).abs() < 1e-9);
    }

    /// Test that empty days are written as nulls in the daily table
    #[test]
    fn test_write_time_series_table_keeps_gaps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("time_series_data.csv");
        let days = generate_time_series(&batch());

        write_time_series_table(&days, &path).unwrap();
        let df = load_time_series_table(&path).unwrap();

        assert_eq!(df.height(), 4);
        assert_eq!(df.column("avg_diameter_km").unwrap().null_count(), 2);
        assert_eq!(df.column("asteroid_count_7d_avg").unwrap().null_count(), 0);
        let counts: Vec<Option<f64>> = df
            .column("asteroid_count")
            .unwrap()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(counts, vec![Some(2.0), Some(0.0), Some(0.0), Some(1.0)]);
    }

    /// Test writing the cleaned table
    #[test]
    fn test_write_clean_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("asteroids_clean.csv");
        let cleaned: Vec<AsteroidRecord> = batch().into_iter().map(|r| r.scored.asteroid).collect();

        write_clean_table(&cleaned, &path).unwrap();
        let df = load_analyzed_table(&path).unwrap();
        assert_eq!(df.height(), 3);
        assert!(df.column("risk_score").is_err());
        assert_eq!(df.column("diameter_mean_km").unwrap().dtype(), &DataType::Float64);
    }

    /// Test that an absent table is reported as a missing artifact
    #[test]
    fn test_missing_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("asteroids_analyzed.csv");
        match load_analyzed_table(&path) {
            Err(PipelineError::MissingUpstreamArtifact(p)) => assert_eq!(p, path),
            other => panic!("expected missing artifact, got {:?}", other),
        }
    }

    /// Test saving and reloading the raw feed
    #[test]
    fn test_save_and_load_raw_feed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw").join("asteroids_raw.json");
        let feed = NeoFeed::from_value(&json!({
            "element_count": 1,
            "near_earth_objects": {
                "2024-01-05": [{"id": "42", "name": "(42)", "is_potentially_hazardous_asteroid": true}]
            }
        }));

        FeedLoader::save_to_file(&feed, &path).unwrap();
        let loaded = FeedLoader::load_from_file(&path).unwrap();

        assert_eq!(loaded.feed, feed);
        assert_eq!(loaded.num_days, 1);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].is_potentially_hazardous, Some(true));
    }
}
