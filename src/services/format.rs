use chrono::{NaiveTime, Timelike};

/// Rupee amount with Indian digit grouping, e.g. `₹1,29,999`.
/// Paise are shown only when the amount is fractional.
pub fn format_price(amount: f64) -> String {
    let negative = amount < 0.0;
    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = paise / 100;
    let fraction = paise % 100;

    let mut out = String::new();
    if negative && paise > 0 {
        out.push('-');
    }
    out.push('₹');
    out.push_str(&group_indian(rupees));
    if fraction > 0 {
        out.push_str(&format!(".{fraction:02}"));
    }
    out
}

fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    groups.push(rest);
    groups.reverse();
    format!("{},{last_three}", groups.join(","))
}

/// `14:30` → `2:30 PM`.
pub fn to_12_hour(time: NaiveTime) -> String {
    let (is_pm, hour) = time.hour12();
    let suffix = if is_pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {suffix}", time.minute())
}

/// Inverse of [`to_12_hour`]; accepts `9:00 AM` and `09:00 am`.
pub fn parse_12_hour(s: &str) -> Option<NaiveTime> {
    let normalized = s.trim().to_uppercase();
    NaiveTime::parse_from_str(&normalized, "%I:%M %p").ok()
}

/// Review counts: `950`, `1.2k`, `3.4M`. Truncates rather than rounds.
pub fn abbreviate_count(n: u64) -> String {
    match n {
        0..=999 => n.to_string(),
        1_000..=999_999 => with_tenths(n / 100, "k"),
        _ => with_tenths(n / 100_000, "M"),
    }
}

fn with_tenths(tenths: u64, suffix: &str) -> String {
    match tenths % 10 {
        0 => format!("{}{suffix}", tenths / 10),
        d => format!("{}.{d}{suffix}", tenths / 10),
    }
}
