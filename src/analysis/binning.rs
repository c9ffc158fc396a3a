//! Distance-interval averaging of the packet log, grouped by bandwidth.
//!
//! Raw link samples are noisy; for plotting, each bandwidth setting gets
//! its own series and samples are averaged over fixed distance intervals.
//! The reduction is pure and works on whatever slice the caller loaded.

use serde::Serialize;

use crate::telemetry::Packet;

/// Signal quality field to average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Snr,
    Rssi,
}

impl Metric {
    /// Stem used in artifact file names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Metric::Snr => "snr",
            Metric::Rssi => "rssi",
        }
    }

    fn value(self, packet: &Packet) -> f64 {
        match self {
            Metric::Snr => packet.snr,
            Metric::Rssi => packet.rssi,
        }
    }
}

/// One averaged point: mean distance and mean metric over an interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub distance: f64,
    pub value: f64,
}

/// Averaged curve for one bandwidth value, points ordered by distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandwidthSeries {
    pub bw: f64,
    pub points: Vec<SeriesPoint>,
}

/// Reduce packets to one averaged series per distinct `bw`, ordered by
/// ascending bandwidth.
///
/// Interval edges sit at `min_distance + i * bin_width`; each half-open
/// interval `[edge, edge + bin_width)` that holds at least one sample
/// yields the mean of its distances and of its metric values. Intervals
/// with no samples produce no point, and a bandwidth group that yields no
/// points at all (every sample at one identical distance) is omitted.
/// A non-positive `bin_width` yields no series.
#[must_use]
pub fn reduce(packets: &[Packet], metric: Metric, bin_width: f64) -> Vec<BandwidthSeries> {
    if bin_width <= 0.0 {
        return Vec::new();
    }

    let mut groups: Vec<(f64, Vec<&Packet>)> = Vec::new();
    for packet in packets {
        match groups.iter_mut().find(|(bw, _)| *bw == packet.bw) {
            Some((_, group)) => group.push(packet),
            None => groups.push((packet.bw, vec![packet])),
        }
    }
    groups.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut series = Vec::new();
    for (bw, group) in groups {
        let points = average_intervals(&group, metric, bin_width);
        if !points.is_empty() {
            series.push(BandwidthSeries { bw, points });
        }
    }
    series
}

fn average_intervals(group: &[&Packet], metric: Metric, bin_width: f64) -> Vec<SeriesPoint> {
    let Some(first) = group.first() else {
        return Vec::new();
    };

    let mut min = first.distance;
    let mut max = first.distance;
    for packet in group.iter().skip(1) {
        min = min.min(packet.distance);
        max = max.max(packet.distance);
    }

    // Edges run from min in bin_width steps, stopping short of
    // max + bin_width. With min == max that is a single edge and zero
    // intervals; a sample sitting exactly on the last edge falls outside
    // every half-open interval.
    let edge_count = ((max - min + bin_width) / bin_width).ceil() as usize;

    let mut points = Vec::new();
    for i in 0..edge_count.saturating_sub(1) {
        let start = min + i as f64 * bin_width;
        let end = min + (i + 1) as f64 * bin_width;

        let mut count = 0_usize;
        let mut distance_sum = 0.0;
        let mut value_sum = 0.0;
        for packet in group {
            if packet.distance >= start && packet.distance < end {
                count += 1;
                distance_sum += packet.distance;
                value_sum += metric.value(packet);
            }
        }

        if count > 0 {
            points.push(SeriesPoint {
                distance: distance_sum / count as f64,
                value: value_sum / count as f64,
            });
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(distance: f64, snr: f64, rssi: f64, bw: f64) -> Packet {
        Packet {
            datetime: "2024-05-01 12:00:00".to_string(),
            distance,
            bit_errors: 0,
            snr,
            rssi,
            sf: 12,
            tx: 17,
            bw,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_two_intervals_average_their_samples() {
        let packets = vec![
            packet(0.0, 10.0, 10.0, 125.0),
            packet(5.0, 10.0, 10.0, 125.0),
            packet(16.0, 1.0, 1.0, 125.0),
            packet(20.0, 1.0, 1.0, 125.0),
        ];

        let series = reduce(&packets, Metric::Snr, 15.0);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].bw, 125.0);
        let points = &series[0].points;
        assert_eq!(points.len(), 2);
        assert!((points[0].distance - 2.5).abs() < 1e-9);
        assert!((points[0].value - 10.0).abs() < 1e-9);
        assert!((points[1].distance - 18.0).abs() < 1e-9);
        assert!((points[1].value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_intervals_yield_no_points() {
        // Samples at 0 and 100 leave the middle intervals empty.
        let packets = vec![
            packet(0.0, 9.0, -80.0, 125.0),
            packet(100.0, 3.0, -110.0, 125.0),
        ];

        let series = reduce(&packets, Metric::Rssi, 15.0);

        assert_eq!(series.len(), 1);
        let points = &series[0].points;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].distance, 0.0);
        assert_eq!(points[0].value, -80.0);
        assert_eq!(points[1].distance, 100.0);
        assert_eq!(points[1].value, -110.0);
    }

    #[test]
    fn test_single_distance_group_is_omitted() {
        // One edge, zero intervals: the whole group disappears.
        let packets = vec![
            packet(50.0, 9.0, -80.0, 125.0),
            packet(50.0, 7.0, -85.0, 125.0),
        ];

        assert!(reduce(&packets, Metric::Snr, 15.0).is_empty());
    }

    #[test]
    fn test_sample_on_final_edge_is_excluded() {
        // Edges at 0, 15, 30; the sample at exactly 30 fits no interval.
        let packets = vec![
            packet(0.0, 10.0, -80.0, 125.0),
            packet(30.0, 2.0, -100.0, 125.0),
        ];

        let series = reduce(&packets, Metric::Snr, 15.0);

        assert_eq!(series.len(), 1);
        let points = &series[0].points;
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].distance, 0.0);
        assert_eq!(points[0].value, 10.0);
    }

    #[test]
    fn test_groups_sorted_by_ascending_bandwidth() {
        let packets = vec![
            packet(0.0, 5.0, -90.0, 500.0),
            packet(20.0, 5.0, -90.0, 500.0),
            packet(0.0, 8.0, -85.0, 125.0),
            packet(20.0, 8.0, -85.0, 125.0),
        ];

        let series = reduce(&packets, Metric::Snr, 15.0);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].bw, 125.0);
        assert_eq!(series[1].bw, 500.0);
    }

    #[test]
    fn test_bandwidth_grouping_is_exact() {
        let packets = vec![
            packet(0.0, 5.0, -90.0, 125.0),
            packet(20.0, 5.0, -90.0, 125.1),
        ];

        let series = reduce(&packets, Metric::Snr, 15.0);

        // Two groups, each with a single distance, both collapse away.
        assert!(series.is_empty());
    }

    #[test]
    fn test_non_positive_bin_width_yields_nothing() {
        let packets = vec![packet(0.0, 5.0, -90.0, 125.0), packet(20.0, 5.0, -90.0, 125.0)];
        assert!(reduce(&packets, Metric::Snr, 0.0).is_empty());
        assert!(reduce(&packets, Metric::Snr, -15.0).is_empty());
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(reduce(&[], Metric::Rssi, 15.0).is_empty());
    }

    #[test]
    fn test_metric_selects_field() {
        let packets = vec![
            packet(0.0, 7.5, -95.0, 125.0),
            packet(20.0, 7.5, -95.0, 125.0),
        ];

        let snr = reduce(&packets, Metric::Snr, 15.0);
        let rssi = reduce(&packets, Metric::Rssi, 15.0);

        assert_eq!(snr[0].points[0].value, 7.5);
        assert_eq!(rssi[0].points[0].value, -95.0);
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(Metric::Snr.name(), "snr");
        assert_eq!(Metric::Rssi.name(), "rssi");
    }
}
