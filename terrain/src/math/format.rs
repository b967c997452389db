use dem::C;

/// Formats a distance given in kilometers.
pub fn format_distance(km: C) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{km:.2} km")
    }
}

/// Formats an area given in m².
pub fn format_area(m2: C) -> String {
    if m2 < 10_000.0 {
        format!("{m2:.0} m²")
    } else {
        format!("{:.2} km²", m2 / 1_000_000.0)
    }
}
