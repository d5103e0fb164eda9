//! 3GPP TS 38.331 A3/A4/A5/D2 measurement-report event detection.
//!
//! Thresholds and hysteresis are grounded verbatim on
//! `original_source/gpp_event_detector.py`'s `_load_config` defaults.
//! Unlike that source (which only evaluates the latest snapshot per
//! satellite), this detector scans every time-point in the aggregated
//! series - see DESIGN.md / SPEC_FULL.md REDESIGN FLAGS.

use chrono::{DateTime, Utc};
use orbit_model::config::EventThresholds;
use orbit_model::{EventRecord, EventType, SatelliteTimeSeries};
use std::collections::{BTreeMap, HashSet};

struct Observation<'a> {
    sat_id: &'a str,
    rsrp_dbm: f64,
    range_km: f64,
}

fn collect_observations<'a>(
    series_list: &'a [SatelliteTimeSeries],
) -> BTreeMap<DateTime<Utc>, Vec<Observation<'a>>> {
    let mut by_time: BTreeMap<DateTime<Utc>, Vec<Observation<'a>>> = BTreeMap::new();

    for series in series_list {
        for snapshot in &series.snapshots {
            if !snapshot.is_connectable() {
                continue;
            }
            let (Some(rsrp), Some(angles)) = (snapshot.rsrp_dbm, snapshot.look_angles) else {
                continue;
            };
            by_time.entry(snapshot.t).or_default().push(Observation {
                sat_id: &series.sat_id,
                rsrp_dbm: rsrp,
                range_km: angles.range_km,
            });
        }
    }

    by_time
}

fn pick_serving<'a, 'b>(
    observations: &'a [Observation<'b>],
    serving_pin: Option<&str>,
) -> Option<&'a Observation<'b>> {
    if let Some(pin) = serving_pin {
        if let Some(o) = observations.iter().find(|o| o.sat_id == pin) {
            return Some(o);
        }
    }
    observations
        .iter()
        .max_by(|a, b| a.rsrp_dbm.partial_cmp(&b.rsrp_dbm).unwrap())
}

/// Detects every A3/A4/A5/D2 event across the full aggregated time series,
/// evaluated independently at each time-point. `serving_pin`, when `Some`,
/// fixes the serving satellite id instead of using the max-RSRP heuristic.
pub fn detect_events(
    series_list: &[SatelliteTimeSeries],
    thresholds: &EventThresholds,
    serving_pin: Option<&str>,
) -> Vec<EventRecord> {
    let by_time = collect_observations(series_list);
    let mut events = Vec::new();
    let mut seen = HashSet::new();

    for (t, observations) in &by_time {
        let Some(serving) = pick_serving(observations, serving_pin) else {
            continue;
        };

        for neighbor in observations.iter().filter(|o| o.sat_id != serving.sat_id) {
            for (event_type, margin) in evaluate_pair(serving, neighbor, thresholds) {
                let key = (event_type, serving.sat_id.to_string(), neighbor.sat_id.to_string(), *t);
                if !seen.insert(key) {
                    continue;
                }
                events.push(make_event(event_type, *t, serving, neighbor, margin, thresholds));
            }
        }
    }

    events.sort_by(|a, b| {
        a.t.cmp(&b.t)
            .then_with(|| b.event_type.tie_break_priority().cmp(&a.event_type.tie_break_priority()))
    });

    events
}

fn evaluate_pair(
    serving: &Observation,
    neighbor: &Observation,
    th: &EventThresholds,
) -> Vec<(EventType, f64)> {
    let mut triggered = Vec::new();

    // A3: neighbor becomes offset-better than serving (3GPP TS 38.331
    // §5.5.4.4, Ofn=Ocn=Off=Ocp=0 defaults).
    let a3_margin = neighbor.rsrp_dbm - th.hys_db - serving.rsrp_dbm;
    if a3_margin > 0.0 {
        triggered.push((EventType::A3, a3_margin));
    }

    // A4: neighbor becomes better than an absolute threshold.
    let a4_margin = neighbor.rsrp_dbm - th.hys_db - th.a4_dbm;
    if a4_margin > 0.0 {
        triggered.push((EventType::A4, a4_margin));
    }

    // A5: dual threshold - serving worse than Thresh1 AND neighbor better
    // than Thresh2. Hysteresis works against the serving sat here (it must
    // drop hys_db *below* Thresh1 to trigger, not just touch it), matching
    // spec's "serving <= -110 dBm" worked example at the default threshold.
    let serving_below = serving.rsrp_dbm - th.hys_db < th.a5_t1_dbm;
    let neighbor_above_margin = neighbor.rsrp_dbm - th.hys_db - th.a5_t2_dbm;
    if serving_below && neighbor_above_margin > 0.0 {
        triggered.push((EventType::A5, neighbor_above_margin));
    }

    // D2: serving satellite has drifted far (> d2_t2_km) while neighbor is
    // close (< d2_t1_km).
    let serving_far_margin = serving.range_km - th.hys_km - th.d2_t2_km;
    let neighbor_near = neighbor.range_km + th.hys_km < th.d2_t1_km;
    if serving_far_margin > 0.0 && neighbor_near {
        triggered.push((EventType::D2, serving_far_margin));
    }

    triggered
}

fn make_event(
    event_type: EventType,
    t: DateTime<Utc>,
    serving: &Observation,
    neighbor: &Observation,
    trigger_margin: f64,
    th: &EventThresholds,
) -> EventRecord {
    let mut measurements = std::collections::BTreeMap::new();
    measurements.insert("serving_rsrp_dbm".to_string(), serving.rsrp_dbm);
    measurements.insert("neighbor_rsrp_dbm".to_string(), neighbor.rsrp_dbm);
    measurements.insert("serving_range_km".to_string(), serving.range_km);
    measurements.insert("neighbor_range_km".to_string(), neighbor.range_km);

    EventRecord {
        event_id: format!("{}-{}-{}-{}", event_type.standard_reference(), serving.sat_id, neighbor.sat_id, t.timestamp_millis()),
        event_type,
        t,
        serving_sat_id: serving.sat_id.to_string(),
        neighbor_sat_id: neighbor.sat_id.to_string(),
        measurements,
        trigger_margin,
        standard_reference: event_type.standard_reference().to_string(),
        time_to_trigger_ms: th.ttt_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use orbit_model::{Constellation, GeodeticPosition, LookAngles, SatelliteSnapshot, Vec3, VisibilityFlags};

    fn snap(sat_id: &str, t: DateTime<Utc>, rsrp: f64, range_km: f64) -> SatelliteSnapshot {
        SatelliteSnapshot {
            sat_id: sat_id.to_string(),
            t,
            position_teme: Vec3::new(0.0, 0.0, 0.0),
            velocity_teme: Vec3::new(0.0, 0.0, 0.0),
            position_itrf: None,
            position_wgs84: Some(GeodeticPosition {
                lat_deg: 0.0,
                lon_deg: 0.0,
                alt_km: 550.0,
            }),
            look_angles: Some(LookAngles {
                elevation_deg: 30.0,
                azimuth_deg: 0.0,
                range_km,
            }),
            visibility_flags: VisibilityFlags {
                elevation_ok: true,
                range_ok: true,
                geographic_ok: true,
            },
            rsrp_dbm: Some(rsrp),
            sinr_db: Some(10.0),
            rsrq_db: None,
            link_margin_db: Some(20.0),
        }
    }

    fn series(sat_id: &str, snapshots: Vec<SatelliteSnapshot>) -> SatelliteTimeSeries {
        SatelliteTimeSeries {
            sat_id: sat_id.to_string(),
            constellation: Constellation::Starlink,
            epoch: snapshots[0].t,
            sampling_interval_s: 30.0,
            snapshots,
        }
    }

    #[test]
    fn a5_fires_exactly_once_at_the_crossing_sample() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::seconds(30);

        let serving = series(
            "serving",
            vec![snap("serving", t0, -108.0, 900.0), snap("serving", t1, -112.0, 900.0)],
        );
        let neighbor = series(
            "neighbor",
            vec![snap("neighbor", t0, -112.0, 900.0), snap("neighbor", t1, -92.0, 900.0)],
        );

        let events = detect_events(&[serving, neighbor], &EventThresholds::default(), None);
        let a5_events: Vec<_> = events.iter().filter(|e| e.event_type == EventType::A5).collect();
        assert_eq!(a5_events.len(), 1);
        assert_eq!(a5_events[0].t, t1);
        assert_eq!(a5_events[0].serving_sat_id, "serving");
        assert_eq!(a5_events[0].neighbor_sat_id, "neighbor");
    }

    #[test]
    fn events_are_non_decreasing_in_time() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::seconds(30);
        let a = series("a", vec![snap("a", t0, -65.0, 900.0), snap("a", t1, -65.0, 900.0)]);
        let b = series("b", vec![snap("b", t0, -105.0, 900.0), snap("b", t1, -70.0, 900.0)]);

        let events = detect_events(&[a, b], &EventThresholds::default(), None);
        for pair in events.windows(2) {
            assert!(pair[0].t <= pair[1].t);
        }
    }
}
