use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_count(count: usize) -> String {
    const UNITS: [&str; 3] = ["", "k", "M"];

    let mut value = count as f64;
    let mut unit = 0usize;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        count.to_string()
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

pub fn format_megabytes(megabytes: f64) -> String {
    if megabytes >= 1024.0 {
        format!("{:.2} GiB", megabytes / 1024.0)
    } else {
        format!("{megabytes:.1} MiB")
    }
}

/// Maps an id onto the unit square. Same id, same point, for the lifetime of the build.
pub fn stable_unit_pair(id: &str) -> (f64, f64) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let scale = u32::MAX as f64 + 1.0;
    let x = (hash & 0xffff_ffff) as f64 / scale;
    let y = ((hash >> 32) & 0xffff_ffff) as f64 / scale;
    (x, y)
}

pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_pair_is_stable_and_in_range() {
        let first = stable_unit_pair("pod-17");
        let second = stable_unit_pair("pod-17");
        assert_eq!(first, second);
        assert!((0.0..1.0).contains(&first.0));
        assert!((0.0..1.0).contains(&first.1));
    }

    #[test]
    fn counts_are_abbreviated() {
        assert_eq!(format_count(950), "950");
        assert_eq!(format_count(12_500), "12.5k");
        assert_eq!(format_count(3_000_000), "3.0M");
    }
}
